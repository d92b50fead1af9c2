//! Stimulus sweep controller: owns the output level and drives the output peripheral.

use eyre::WrapErr;
use tester_traits::StimulusOutput;

use crate::error::Result;
use crate::hw_error::map_hw_error;

/// Walks the output from 0 to `reference_max` in fixed steps.
///
/// Only issues levels; settling is reported by the peripheral as
/// `Event::StimulusSettled`.
pub struct SweepController<O: StimulusOutput> {
    output: O,
    level: u32,
    step_size: u32,
    reference_max: u32,
    advances: u32,
}

impl<O: StimulusOutput> core::fmt::Debug for SweepController<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SweepController")
            .field("level", &self.level)
            .field("step_size", &self.step_size)
            .field("reference_max", &self.reference_max)
            .field("advances", &self.advances)
            .finish()
    }
}

impl<O: StimulusOutput> SweepController<O> {
    pub fn new(output: O, step_size: u32, reference_max: u32) -> Self {
        Self {
            output,
            level: 0,
            step_size,
            reference_max,
            advances: 0,
        }
    }

    /// Current output level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Advances made since the last `reset()`.
    pub fn advances(&self) -> u32 {
        self.advances
    }

    pub fn at_maximum(&self) -> bool {
        self.level >= self.reference_max
    }

    /// Issue level 0 and restart the advance count.
    ///
    /// On failure the previous level is kept: it is still what the output holds.
    pub fn reset(&mut self) -> Result<()> {
        self.issue(0)?;
        self.level = 0;
        self.advances = 0;
        Ok(())
    }

    /// Step the output up and issue the new level; returns it.
    ///
    /// Must not be called at the maximum: that panics in debug builds and is a
    /// no-op in release builds. The final step is clamped to `reference_max`.
    pub fn advance(&mut self) -> Result<u32> {
        debug_assert!(
            !self.at_maximum(),
            "advance past sweep maximum ({})",
            self.reference_max
        );
        if self.at_maximum() {
            return Ok(self.level);
        }
        let next = self
            .level
            .saturating_add(self.step_size)
            .min(self.reference_max);
        self.issue(next)?;
        self.level = next;
        self.advances = self.advances.saturating_add(1);
        Ok(next)
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    fn issue(&mut self, level: u32) -> Result<()> {
        tracing::trace!(level, "issue stimulus");
        self.output
            .set_level(level)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("set stimulus level {level}"))
    }
}
