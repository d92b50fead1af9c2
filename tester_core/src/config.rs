//! Runtime configuration for the tester core.
//!
//! Separate from the TOML-deserialized config in `tester_config`; see
//! `conversions` for the mapping.

/// Sweep and decision parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepCfg {
    /// Upper bound of the stimulus sweep (inclusive), in output units.
    pub reference_max: u32,
    /// Increment per sweep step.
    pub step_size: u32,
    /// Raw samples collected per stimulus level before taking the median.
    pub sample_count: usize,
    /// A median whose magnitude reaches this value fails the run.
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

impl SweepCfg {
    /// Number of `advance()` calls a clean sweep makes before passing.
    ///
    /// The last step is clamped to `reference_max` when it does not divide evenly.
    pub fn advances(&self) -> u32 {
        self.reference_max.div_ceil(self.step_size.max(1))
    }

    /// Number of stimulus levels measured by a clean sweep (level 0 included).
    pub fn levels(&self) -> u32 {
        self.advances() + 1
    }
}

/// Texts written to the display at lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCfg {
    pub wait_text: String,
    pub pass_text: String,
    pub fail_text: String,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            wait_text: "WAIT".to_string(),
            pass_text: "PASS".to_string(),
            fail_text: "FAIL".to_string(),
        }
    }
}
