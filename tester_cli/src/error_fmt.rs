//! Human-readable error descriptions, structured JSON errors and exit codes.

use tester_core::Verdict;
use tester_core::error::{BuildError, TesterError};
use tester_hardware::error::HwError;

pub const EXIT_PASS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_FAIL: i32 = 3;

pub fn exit_code_for_verdict(verdict: Option<Verdict>) -> i32 {
    match verdict {
        Some(Verdict::Pass) => EXIT_PASS,
        Some(Verdict::Fail) => EXIT_FAIL,
        None => EXIT_ERROR,
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingOutput => {
                "What happened: No stimulus output was provided to the tester.\nLikely causes: The DAC failed to initialize or was not wired into the builder.\nHow to fix: Ensure the output is created successfully and passed via with_output(...).".to_string()
            }
            BuildError::MissingInput => {
                "What happened: No sample input was provided to the tester.\nLikely causes: The ADC failed to initialize or was not wired into the builder.\nHow to fix: Ensure the input is created successfully and passed via with_input(...).".to_string()
            }
            BuildError::MissingDisplay => {
                "What happened: No display was provided to the tester.\nLikely causes: The display was not wired into the builder.\nHow to fix: Pass a display via with_display(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the [sweep] or [display] sections.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TesterError>() {
        return match te {
            TesterError::OutOfOrder { event, phase } => format!(
                "What happened: A peripheral raised '{event}' while the tester was {phase}.\nLikely causes: A duplicate completion interrupt or a converter reporting before it was asked.\nHow to fix: Check the converter driver and interrupt wiring; re-run with --log-level=debug."
            ),
            TesterError::Disconnected => {
                "What happened: The event source went away in the middle of a run.\nLikely causes: A peripheral thread exited or the hardware was unplugged.\nHow to fix: Check the converter and button connections, then start a new run.".to_string()
            }
            TesterError::Hardware(msg) => format!(
                "What happened: A peripheral reported an error ({msg}).\nLikely causes: I2C wiring, wrong device address, or missing power.\nHow to fix: Verify [pins] addresses and the bus wiring, then rerun."
            ),
        };
    }

    if let Some(he) = err.downcast_ref::<HwError>() {
        return match he {
            HwError::Timeout => "What happened: The ADC did not finish a conversion in time.\nLikely causes: Wrong ADC address or a device not responding on the bus.\nHow to fix: Check pins.adc_address and the I2C wiring.".to_string(),
            HwError::Gpio(msg) => format!(
                "What happened: Failed to set up the button GPIO ({msg}).\nLikely causes: Incorrect pin number or insufficient GPIO permissions.\nHow to fix: Fix pins.button in the config; ensure the process may access GPIO."
            ),
            HwError::I2c(msg) => format!(
                "What happened: I2C access failed ({msg}).\nLikely causes: Bus not enabled, wrong bus number or address.\nHow to fix: Enable I2C, then check pins.i2c_bus and the device addresses."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug for more detail."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML.\nLikely causes: A typo or an unknown value ({}).\nHow to fix: Fix the file; every section is optional, an empty file uses the reference settings.",
            te.message()
        );
    }

    // String-based heuristics for errors coming from config and CSV loading
    let msg = err.to_string();
    let root = err.root_cause().to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid ({root}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file and try again."
        );
    }

    if root.contains("device curve CSV must have headers") {
        return "Invalid headers in device curve CSV. Expected 'level,reading'.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if root != msg {
        cause = format!(" Cause: {root}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "BuildError";
    }
    if let Some(te) = err.downcast_ref::<TesterError>() {
        return match te {
            TesterError::OutOfOrder { .. } => "OutOfOrder",
            TesterError::Disconnected => "Disconnected",
            TesterError::Hardware(_) => "Hardware",
        };
    }
    if err.downcast_ref::<HwError>().is_some() {
        return "Hardware";
    }
    if err.downcast_ref::<toml::de::Error>().is_some()
        || err.to_string().contains("invalid configuration")
    {
        return "Config";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "message": humanize(err),
        "detail": err.root_cause().to_string(),
    })
    .to_string()
}
