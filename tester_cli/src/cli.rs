//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "tester", version, about = "Sweep tester CLI")]
pub struct Cli {
    /// Path to config TOML; a missing file means built-in defaults
    #[arg(long, value_name = "FILE", default_value = "etc/tester.toml")]
    pub config: PathBuf,

    /// Log as JSON lines and print results as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); defaults to [logging] level, then warn
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Simulated device under test.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DeviceArg {
    /// Healthy device that clamps below the fail threshold
    Good,
    /// Open device following the stimulus to full scale
    Open,
    /// Response curve from --curve
    Curve,
}

impl From<DeviceArg> for tester_config::DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Good => Self::Good,
            DeviceArg::Open => Self::Open,
            DeviceArg::Curve => Self::Curve,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Press start, sweep to a verdict, press again to clear
    Run {
        /// Override [simulation] device
        #[arg(long, value_enum)]
        device: Option<DeviceArg>,
        /// Device response CSV (level,reading); implies --device curve
        #[arg(long, value_name = "FILE")]
        curve: Option<PathBuf>,
        /// Write the per-step medians as CSV (step,level,median)
        #[arg(long, value_name = "FILE")]
        trace: Option<PathBuf>,
        /// Drive the real converters and wait for the physical button
        #[cfg(all(feature = "hardware", target_os = "linux"))]
        #[arg(long, action = ArgAction::SetTrue)]
        hardware: bool,
    },
    /// Interactive bench: each line on stdin presses the button; Ctrl-C stops
    Serve {
        /// Override [simulation] device
        #[arg(long, value_enum)]
        device: Option<DeviceArg>,
        /// Device response CSV (level,reading); implies --device curve
        #[arg(long, value_name = "FILE")]
        curve: Option<PathBuf>,
    },
    /// Validate config and construct the peripherals
    SelfCheck,
}
