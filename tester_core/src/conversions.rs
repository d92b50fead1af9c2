//! `From` implementations bridging `tester_config` types to `tester_core` types.

use crate::config::{DisplayCfg, SweepCfg};

impl From<&tester_config::SweepCfg> for SweepCfg {
    fn from(c: &tester_config::SweepCfg) -> Self {
        Self {
            reference_max: c.reference_max,
            step_size: c.step_size,
            sample_count: c.sample_count,
            fail_threshold: c.fail_threshold,
        }
    }
}

impl From<&tester_config::DisplayCfg> for DisplayCfg {
    fn from(c: &tester_config::DisplayCfg) -> Self {
        Self {
            wait_text: c.wait_text.clone(),
            pass_text: c.pass_text.clone(),
            fail_text: c.fail_text.clone(),
        }
    }
}
