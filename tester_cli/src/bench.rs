//! Bench assembly: peripherals, tester and event loop wired to one channel.

use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use serde_json::{Value, json};
use tester_config::{Config, DeviceKind};
use tester_core::{DisplayCfg, EventLoop, RunReport, StepRecord, SweepCfg, Tester};
use tester_hardware::{AnalogNode, DeviceModel, DisplayHandle, SimAdc, SimButton, SimDac, SimDisplay};
use tester_traits::{Display, SampleInput, StimulusOutput, event_channel};

use crate::cli::DeviceArg;

pub type BenchLoop = EventLoop<Box<dyn StimulusOutput>, Box<dyn SampleInput>, Box<dyn Display>>;
pub type DisplayObserver = Box<dyn FnMut(&str) + Send>;

pub struct Bench {
    pub events: BenchLoop,
    /// Software button; `None` when a physical button drives the bench.
    pub button: Option<SimButton>,
    pub display: DisplayHandle,
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    _gpio: Option<tester_hardware::GpioButton>,
}

/// Apply `--device` / `--curve` on top of `[simulation]`.
pub fn apply_device_overrides(cfg: &mut Config, device: Option<DeviceArg>, curve: Option<PathBuf>) {
    if let Some(path) = curve {
        cfg.simulation.curve = Some(path);
        cfg.simulation.device = DeviceKind::Curve;
    }
    if let Some(d) = device {
        cfg.simulation.device = d.into();
    }
}

fn device_model(cfg: &Config) -> Result<DeviceModel> {
    let curve = match (cfg.simulation.device, cfg.simulation.curve.as_deref()) {
        (DeviceKind::Curve, Some(path)) => Some(tester_config::load_curve_csv(path)?),
        _ => None,
    };
    Ok(DeviceModel::from_config(&cfg.simulation, curve)?)
}

fn display(observer: Option<DisplayObserver>) -> (SimDisplay, DisplayHandle) {
    let mut display = SimDisplay::new();
    if let Some(f) = observer {
        display = display.with_observer(f);
    }
    let handle = display.handle();
    (display, handle)
}

/// Simulated DAC, device model and ADC on a shared node.
pub fn simulated(cfg: &Config, observer: Option<DisplayObserver>) -> Result<Bench> {
    let (sink, rx) = event_channel();
    let node = AnalogNode::new();
    let dac = SimDac::new(
        node.clone(),
        sink.clone(),
        cfg.sweep.reference_max,
        cfg.dac.resolution_bits,
    );
    let adc = SimAdc::new(node, sink.clone(), device_model(cfg)?, cfg.adc.full_scale);
    let (display, handle) = display(observer);

    let tester = Tester::builder()
        .with_output(dac)
        .with_input(adc)
        .with_display(display)
        .with_sweep(SweepCfg::from(&cfg.sweep))
        .with_display_texts(DisplayCfg::from(&cfg.display))
        .build()?;
    tracing::debug!(device = ?cfg.simulation.device, "simulated bench ready");

    Ok(Bench {
        events: EventLoop::new(tester.into_core(), rx),
        button: Some(SimButton::new(sink)),
        display: handle,
        #[cfg(all(feature = "hardware", target_os = "linux"))]
        _gpio: None,
    })
}

/// MCP4725 output, ADS1115 input and a GPIO button; the display stays on the console.
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn hardware(cfg: &Config, observer: Option<DisplayObserver>) -> Result<Bench> {
    use std::time::Duration;
    use tester_hardware::{Ads1115Adc, GpioButton, Mcp4725Dac};

    let (sink, rx) = event_channel();
    let dac = Mcp4725Dac::new(
        cfg.pins.i2c_bus,
        cfg.pins.dac_address,
        cfg.sweep.reference_max,
        sink.clone(),
    )
    .wrap_err("open dac")?;
    let adc = Ads1115Adc::new(cfg.pins.i2c_bus, cfg.pins.adc_address, sink.clone())
        .wrap_err("open adc")?;
    let gpio = GpioButton::new(
        cfg.pins.button,
        cfg.pins.button_active_low,
        Duration::from_millis(cfg.pins.button_debounce_ms),
        sink,
    )
        .wrap_err("open button")?;
    let (display, handle) = display(observer);

    let tester = Tester::builder()
        .with_output(dac)
        .with_input(adc)
        .with_display(display)
        .with_sweep(SweepCfg::from(&cfg.sweep))
        .with_display_texts(DisplayCfg::from(&cfg.display))
        .build()?;

    Ok(Bench {
        events: EventLoop::new(tester.into_core(), rx),
        button: None,
        display: handle,
        _gpio: Some(gpio),
    })
}

/// Outcome of one start-to-clear cycle.
pub struct Cycle {
    pub report: RunReport,
    /// Display contents at the verdict, before the clearing press.
    pub shown: String,
}

/// Press start, wait for the verdict, then press again to clear.
///
/// With a physical button both presses come from the operator, so only the
/// verdict is awaited.
pub fn run_cycle(bench: &mut Bench) -> Result<Cycle> {
    match &bench.button {
        Some(button) => button.press().wrap_err("press start")?,
        None => tracing::info!("waiting for start button"),
    }
    let report = bench.events.run_once()?;
    let shown = bench.display.text();
    if let Some(button) = &bench.button {
        button.press().wrap_err("press clear")?;
        bench.events.drain_pending()?;
    }
    Ok(Cycle { report, shown })
}

pub fn write_trace(path: &Path, report: &RunReport) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .wrap_err_with(|| format!("create trace file {}", path.display()))?;
    w.write_record(["step", "level", "median"])?;
    for s in &report.steps {
        w.write_record([s.step.to_string(), s.level.to_string(), s.median.to_string()])?;
    }
    w.flush()?;
    Ok(())
}

fn step_json(s: &StepRecord) -> Value {
    json!({ "step": s.step, "level": s.level, "median": s.median })
}

pub fn report_json(report: &RunReport, sweep: &SweepCfg) -> Value {
    json!({
        "verdict": report.verdict.map(|v| v.as_str()),
        "steps": report.steps.len(),
        "advances": report.advances,
        "levels": sweep.levels(),
        "fail_threshold": sweep.fail_threshold,
        "failed_at": report.failed_at().map(step_json),
        "peak": report.peak().map(step_json),
        "trace": report.steps.iter().map(step_json).collect::<Vec<_>>(),
    })
}

/// One-line human summary of a finished run.
pub fn report_line(report: &RunReport, sweep: &SweepCfg) -> String {
    if let Some(at) = report.failed_at() {
        return format!(
            "FAIL at step {}: level {} median {} (threshold {})",
            at.step, at.level, at.median, sweep.fail_threshold
        );
    }
    match (report.verdict, report.peak()) {
        (Some(v), Some(peak)) => format!(
            "{v}: {} steps, peak {} at level {}",
            report.steps.len(),
            peak.median,
            peak.level
        ),
        (Some(v), None) => v.to_string(),
        (None, _) => "no verdict".to_string(),
    }
}
