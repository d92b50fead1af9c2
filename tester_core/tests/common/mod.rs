//! Recording peripherals for driving the tester by hand.
#![allow(dead_code)]

use tester_core::{DisplayCfg, Event, LifecycleState, SweepCfg, TesterG, build_tester};
use tester_traits::{BoxError, Display, SampleInput, StimulusOutput};

#[derive(Debug, Default)]
pub struct SpyOutput {
    pub levels: Vec<u32>,
    /// Fail one write once this many have succeeded; later writes succeed.
    pub fail_after: Option<usize>,
}

impl StimulusOutput for SpyOutput {
    fn set_level(&mut self, level: u32) -> Result<(), BoxError> {
        if self.fail_after.is_some_and(|n| self.levels.len() >= n) {
            self.fail_after = None;
            return Err(Box::new(std::io::Error::other("dac nack")));
        }
        self.levels.push(level);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SpyInput {
    pub requests: usize,
}

impl SampleInput for SpyInput {
    fn request_sample(&mut self) -> Result<(), BoxError> {
        self.requests += 1;
        Ok(())
    }
}

/// Records `clear` as `""` and every text write verbatim.
#[derive(Debug, Default)]
pub struct SpyDisplay {
    pub log: Vec<String>,
}

impl SpyDisplay {
    pub fn shown(&self) -> Option<&str> {
        self.log.last().map(String::as_str)
    }
}

impl Display for SpyDisplay {
    fn clear(&mut self) -> Result<(), BoxError> {
        self.log.push(String::new());
        Ok(())
    }
    fn show_text(&mut self, text: &str) -> Result<(), BoxError> {
        self.log.push(text.to_string());
        Ok(())
    }
}

pub type SpyTester = TesterG<SpyOutput, SpyInput, SpyDisplay>;

pub fn spy_tester(cfg: SweepCfg) -> SpyTester {
    flaky_tester(cfg, None)
}

/// Like `spy_tester`, with one output write failing after `fail_after` successes.
pub fn flaky_tester(cfg: SweepCfg, fail_after: Option<usize>) -> SpyTester {
    build_tester(
        SpyOutput {
            levels: Vec::new(),
            fail_after,
        },
        SpyInput::default(),
        SpyDisplay::default(),
        Some(cfg),
        Some(DisplayCfg::default()),
    )
    .unwrap()
}

/// Play the peripherals for one level: settle, then deliver `samples`.
pub fn feed_level(t: &mut SpyTester, samples: &[i32]) -> LifecycleState {
    let mut state = t.handle(Event::StimulusSettled).unwrap();
    for &s in samples {
        state = t.handle(Event::SampleReady(s)).unwrap();
    }
    state
}

/// Deliver the same reading `n` times at the current level.
pub fn feed_constant(t: &mut SpyTester, value: i32) -> LifecycleState {
    let n = t.sweep_cfg().sample_count;
    feed_level(t, &vec![value; n])
}
