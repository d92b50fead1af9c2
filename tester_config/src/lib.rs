#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and device-response parsing for the sweep tester.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every section has defaults; an empty file is the reference setup
//!   (0..=2500 in steps of 50, 9 samples, fail at 4030).
//! - The device-response CSV loader enforces headers and ordering before
//!   building an interpolated curve for the simulated bench.
use eyre::WrapErr;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Largest accepted `sweep.sample_count`.
pub const MAX_SAMPLE_COUNT: usize = 64;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SweepCfg {
    /// Upper bound of the stimulus sweep
    pub reference_max: u32,
    /// Increment per sweep step
    pub step_size: u32,
    /// Samples medianed per step
    pub sample_count: usize,
    /// Absolute reading at or above which the run fails
    pub fail_threshold: u32,
}

impl Default for SweepCfg {
    fn default() -> Self {
        Self {
            reference_max: 2500,
            step_size: 50,
            sample_count: 9,
            fail_threshold: 4030,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayCfg {
    pub wait_text: String,
    pub pass_text: String,
    pub fail_text: String,
    /// Character width of the console display frame
    pub width: usize,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            wait_text: "WAIT".to_string(),
            pass_text: "PASS".to_string(),
            fail_text: "FAIL".to_string(),
            width: 16,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct DacCfg {
    /// Output converter resolution; codes span 0..2^bits
    pub resolution_bits: u8,
}

impl Default for DacCfg {
    fn default() -> Self {
        Self {
            resolution_bits: 12,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct AdcCfg {
    /// Largest raw reading the input converter produces
    pub full_scale: i32,
}

impl Default for AdcCfg {
    fn default() -> Self {
        Self { full_scale: 4095 }
    }
}

/// Which device-under-test the simulated bench models.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Response clamps at `simulation.clamp`
    #[default]
    Good,
    /// No clamp: the response follows the stimulus up to ADC full scale
    Open,
    /// Response read from `simulation.curve`
    Curve,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationCfg {
    pub device: DeviceKind,
    /// Reading counts per stimulus unit before clamping
    pub gain: f32,
    /// Clamp level of a good device, in reading counts
    pub clamp: i32,
    /// Peak noise added to each reading (uniform in -noise..=noise)
    pub noise: i32,
    /// Noise generator seed; 0 is replaced by a fixed non-zero seed
    pub seed: u32,
    /// Device response CSV (`level,reading`) used when `device = "curve"`
    pub curve: Option<PathBuf>,
}

impl Default for SimulationCfg {
    fn default() -> Self {
        Self {
            device: DeviceKind::Good,
            gain: 1.7,
            clamp: 3800,
            noise: 6,
            seed: 0x2545_F491,
            curve: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Pins {
    /// Start/reset button GPIO (BCM numbering)
    pub button: u8,
    /// Treat low level as pressed when true
    pub button_active_low: bool,
    /// Edges closer than this to the last accepted press are contact bounce
    pub button_debounce_ms: u64,
    /// I2C bus number shared by DAC and ADC
    pub i2c_bus: u8,
    /// I2C address of the output DAC
    pub dac_address: u16,
    /// I2C address of the input ADC
    pub adc_address: u16,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            button: 17,
            button_active_low: true,
            button_debounce_ms: 50,
            i2c_bus: 1,
            dac_address: 0x60,
            adc_address: 0x48,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sweep: SweepCfg,
    pub display: DisplayCfg,
    pub dac: DacCfg,
    pub adc: AdcCfg,
    pub simulation: SimulationCfg,
    pub pins: Pins,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a TOML config file. Validation is left to the caller.
///
/// The I/O and TOML errors stay in the chain, so callers can downcast them.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sweep
        if self.sweep.reference_max == 0 {
            eyre::bail!("sweep.reference_max must be > 0");
        }
        if self.sweep.step_size == 0 {
            eyre::bail!("sweep.step_size must be > 0");
        }
        if self.sweep.step_size > self.sweep.reference_max {
            eyre::bail!("sweep.step_size must be <= sweep.reference_max");
        }
        if self.sweep.sample_count == 0 || self.sweep.sample_count > MAX_SAMPLE_COUNT {
            eyre::bail!("sweep.sample_count must be in 1..={MAX_SAMPLE_COUNT}");
        }
        if self.sweep.fail_threshold == 0 {
            eyre::bail!("sweep.fail_threshold must be > 0");
        }

        // Display
        if self.display.wait_text.is_empty()
            || self.display.pass_text.is_empty()
            || self.display.fail_text.is_empty()
        {
            eyre::bail!("display texts must not be empty");
        }
        if self.display.width < 4 {
            eyre::bail!("display.width must be >= 4");
        }

        // Converters
        if !(1..=16).contains(&self.dac.resolution_bits) {
            eyre::bail!("dac.resolution_bits must be in 1..=16");
        }
        if self.adc.full_scale <= 0 {
            eyre::bail!("adc.full_scale must be > 0");
        }

        // Simulation
        if !self.simulation.gain.is_finite() || self.simulation.gain <= 0.0 {
            eyre::bail!("simulation.gain must be finite and > 0");
        }
        if self.simulation.noise < 0 {
            eyre::bail!("simulation.noise must be >= 0");
        }
        if self.simulation.clamp < 0 {
            eyre::bail!("simulation.clamp must be >= 0");
        }
        if self.simulation.device == DeviceKind::Curve && self.simulation.curve.is_none() {
            eyre::bail!("simulation.curve is required when simulation.device = \"curve\"");
        }

        // Pins
        if self.pins.button_debounce_ms > 1000 {
            eyre::bail!("pins.button_debounce_ms must be <= 1000");
        }

        // Logging
        if let Some(rotation) = self.logging.rotation.as_deref() {
            if !matches!(rotation, "never" | "daily" | "hourly") {
                eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rotation:?}");
            }
        }

        Ok(())
    }
}

/// Device response CSV schema.
///
/// Expected headers:
/// level,reading
///
/// Example:
/// level,reading
/// 0,3
/// 1250,2120
/// 2500,3790
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CurvePoint {
    pub level: u32,
    pub reading: i32,
}

/// Piecewise-linear device response over stimulus level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCurve {
    points: Vec<CurvePoint>,
}

impl DeviceCurve {
    /// Build from rows; levels must be strictly increasing.
    pub fn from_rows(rows: Vec<CurvePoint>) -> eyre::Result<Self> {
        if rows.is_empty() {
            eyre::bail!("device curve requires at least one row");
        }
        for (i, pair) in rows.windows(2).enumerate() {
            if pair[1].level <= pair[0].level {
                eyre::bail!(
                    "device curve levels must be strictly increasing (rows {} and {})",
                    i + 2,
                    i + 3
                );
            }
        }
        Ok(Self { points: rows })
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Reading at `level`: linear between points, flat beyond the ends.
    pub fn reading_at(&self, level: u32) -> i32 {
        let idx = self.points.partition_point(|p| p.level <= level);
        if idx == 0 {
            return self.points[0].reading;
        }
        let lo = self.points[idx - 1];
        let Some(hi) = self.points.get(idx).copied() else {
            return lo.reading;
        };
        // lo.level <= level < hi.level
        let span = i128::from(hi.level - lo.level);
        let dx = i128::from(level - lo.level);
        let dy = i128::from(hi.reading) - i128::from(lo.reading);
        let y = i128::from(lo.reading) + (dy * dx) / span;
        y.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32
    }
}

impl TryFrom<Vec<CurvePoint>> for DeviceCurve {
    type Error = eyre::Report;
    fn try_from(rows: Vec<CurvePoint>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

pub fn load_curve_csv(path: &Path) -> eyre::Result<DeviceCurve> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open device curve CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["level", "reading"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "device curve CSV must have headers 'level,reading', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CurvePoint>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    DeviceCurve::try_from(rows)
}
