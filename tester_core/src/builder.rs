//! Type-state builder for `Tester` and generic `build_tester` constructor.
//!
//! The builder enforces at compile time that the output, input, and display are
//! provided before `build()` is available. `try_build()` is always available for
//! dynamic checks.

use std::marker::PhantomData;

use tester_traits::{Display, Event, SampleInput, StimulusOutput};

use crate::acquisition::AcquisitionCycle;
use crate::config::{DisplayCfg, SweepCfg};
use crate::core::TesterCore;
use crate::error::{BuildError, Result};
use crate::report::RunReport;
use crate::status::LifecycleState;
use crate::sweep::SweepController;

/// Largest accepted `sample_count`.
pub const MAX_SAMPLE_COUNT: usize = 64;

/// Core over boxed peripherals.
pub type DynCore = TesterCore<Box<dyn StimulusOutput>, Box<dyn SampleInput>, Box<dyn Display>>;

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Tester over boxed peripherals.
pub struct Tester {
    pub(crate) inner: DynCore,
}

impl core::fmt::Debug for Tester {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.inner, f)
    }
}

impl Tester {
    /// Start building a Tester.
    pub fn builder() -> TesterBuilder<Missing, Missing, Missing> {
        TesterBuilder::default()
    }

    /// Handle one peripheral event.
    pub fn handle(&mut self, event: Event) -> Result<LifecycleState> {
        self.inner.handle(event)
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.state()
    }

    pub fn report(&self) -> &RunReport {
        self.inner.report()
    }

    pub fn level(&self) -> u32 {
        self.inner.level()
    }

    pub fn sweep_cfg(&self) -> &SweepCfg {
        self.inner.sweep_cfg()
    }

    pub fn ignored_events(&self) -> u64 {
        self.inner.ignored_events()
    }

    /// Unwrap into the generic core (e.g. to hand it to an `EventLoop`).
    pub fn into_core(self) -> DynCore {
        self.inner
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Tester`. All fields are validated on `build()`.
pub struct TesterBuilder<O, I, D> {
    output: Option<Box<dyn StimulusOutput>>,
    input: Option<Box<dyn SampleInput>>,
    display: Option<Box<dyn Display>>,
    sweep: Option<SweepCfg>,
    texts: Option<DisplayCfg>,
    _o: PhantomData<O>,
    _i: PhantomData<I>,
    _d: PhantomData<D>,
}

impl Default for TesterBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            output: None,
            input: None,
            display: None,
            sweep: None,
            texts: None,
            _o: PhantomData,
            _i: PhantomData,
            _d: PhantomData,
        }
    }
}

/// Validate configuration and construct a `TesterCore`.
///
/// Single source of truth for validation, used by both
/// `TesterBuilder::try_build()` and `build_tester()`.
fn validate_and_build<O: StimulusOutput, I: SampleInput, D: Display>(
    output: O,
    input: I,
    display: D,
    cfg: SweepCfg,
    texts: DisplayCfg,
) -> Result<TesterCore<O, I, D>> {
    if cfg.reference_max == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "reference_max must be > 0",
        )));
    }
    if cfg.step_size == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "step_size must be > 0",
        )));
    }
    if cfg.step_size > cfg.reference_max {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "step_size must be <= reference_max",
        )));
    }
    if !(1..=MAX_SAMPLE_COUNT).contains(&cfg.sample_count) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sample_count must be in 1..=64",
        )));
    }
    if cfg.fail_threshold == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "fail_threshold must be > 0",
        )));
    }
    if texts.wait_text.is_empty() || texts.pass_text.is_empty() || texts.fail_text.is_empty() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "display texts must not be empty",
        )));
    }

    Ok(TesterCore {
        sweep: SweepController::new(output, cfg.step_size, cfg.reference_max),
        acquisition: AcquisitionCycle::new(input, cfg.sample_count),
        display,
        cfg,
        texts,
        state: LifecycleState::Idle,
        report: RunReport::default(),
        runs_started: 0,
        ignored_events: 0,
    })
}

impl<O, I, D> TesterBuilder<O, I, D> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Tester> {
        let output = self
            .output
            .ok_or_else(|| eyre::Report::new(BuildError::MissingOutput))?;
        let input = self
            .input
            .ok_or_else(|| eyre::Report::new(BuildError::MissingInput))?;
        let display = self
            .display
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDisplay))?;

        let inner = validate_and_build(
            output,
            input,
            display,
            self.sweep.unwrap_or_default(),
            self.texts.unwrap_or_default(),
        )?;
        Ok(Tester { inner })
    }

    pub fn with_sweep(mut self, sweep: SweepCfg) -> Self {
        self.sweep = Some(sweep);
        self
    }

    pub fn with_display_texts(mut self, texts: DisplayCfg) -> Self {
        self.texts = Some(texts);
        self
    }
}

// Setters that advance type-state
impl<I, D> TesterBuilder<Missing, I, D> {
    pub fn with_output(self, output: impl StimulusOutput + 'static) -> TesterBuilder<Set, I, D> {
        TesterBuilder {
            output: Some(Box::new(output)),
            input: self.input,
            display: self.display,
            sweep: self.sweep,
            texts: self.texts,
            _o: PhantomData,
            _i: PhantomData,
            _d: PhantomData,
        }
    }
}

impl<O, D> TesterBuilder<O, Missing, D> {
    pub fn with_input(self, input: impl SampleInput + 'static) -> TesterBuilder<O, Set, D> {
        TesterBuilder {
            output: self.output,
            input: Some(Box::new(input)),
            display: self.display,
            sweep: self.sweep,
            texts: self.texts,
            _o: PhantomData,
            _i: PhantomData,
            _d: PhantomData,
        }
    }
}

impl<O, I> TesterBuilder<O, I, Missing> {
    pub fn with_display(self, display: impl Display + 'static) -> TesterBuilder<O, I, Set> {
        TesterBuilder {
            output: self.output,
            input: self.input,
            display: Some(Box::new(display)),
            sweep: self.sweep,
            texts: self.texts,
            _o: PhantomData,
            _i: PhantomData,
            _d: PhantomData,
        }
    }
}

impl TesterBuilder<Set, Set, Set> {
    /// Validate and build. Only available when all three peripherals are set.
    pub fn build(self) -> Result<Tester> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias using the unified core.
pub type TesterG<O, I, D> = TesterCore<O, I, D>;

/// Build a generic, statically-dispatched `TesterG` from concrete peripherals.
pub fn build_tester<O, I, D>(
    output: O,
    input: I,
    display: D,
    sweep: Option<SweepCfg>,
    texts: Option<DisplayCfg>,
) -> Result<TesterG<O, I, D>>
where
    O: StimulusOutput,
    I: SampleInput,
    D: Display,
{
    validate_and_build(
        output,
        input,
        display,
        sweep.unwrap_or_default(),
        texts.unwrap_or_default(),
    )
}
