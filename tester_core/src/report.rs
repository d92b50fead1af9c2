//! Per-run record of step medians and the verdict.

use crate::status::Verdict;

/// One measured stimulus level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRecord {
    /// 0-based index of the level within the sweep.
    pub step: u32,
    pub level: u32,
    pub median: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// `None` while the run is in flight.
    pub verdict: Option<Verdict>,
    pub steps: Vec<StepRecord>,
    /// Sweep advances made during the run.
    pub advances: u32,
}

impl RunReport {
    pub(crate) fn with_capacity(levels: usize) -> Self {
        Self {
            verdict: None,
            steps: Vec::with_capacity(levels),
            advances: 0,
        }
    }

    /// The step that tripped the threshold, if the run failed.
    pub fn failed_at(&self) -> Option<&StepRecord> {
        match self.verdict {
            Some(Verdict::Fail) => self.steps.last(),
            _ => None,
        }
    }

    /// Step with the largest median magnitude.
    pub fn peak(&self) -> Option<&StepRecord> {
        self.steps.iter().max_by_key(|s| s.median.unsigned_abs())
    }

    pub fn is_complete(&self) -> bool {
        self.verdict.is_some()
    }
}
