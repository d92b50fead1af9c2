//! Lifecycle states and verdicts.

/// Terminal classification of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
        }
    }
}

impl core::fmt::Display for Verdict {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of the tester, gated by the button.
///
/// `Idle --press--> Running --median--> Halted(v) --press--> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    /// A sweep is in flight; button presses are masked.
    Running,
    Halted(Verdict),
}

impl LifecycleState {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Running => "running",
            LifecycleState::Halted(Verdict::Pass) => "halted(pass)",
            LifecycleState::Halted(Verdict::Fail) => "halted(fail)",
        }
    }

    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            LifecycleState::Halted(v) => Some(*v),
            _ => None,
        }
    }
}
