//! The lifecycle state machine (`TesterCore`).
//!
//! One owned struct holds every piece of run state. Each hardware event is
//! handled to completion through `&mut self` before the next one is looked at,
//! the single-consumer equivalent of masking interrupts around each handler.

use eyre::WrapErr;
use tester_traits::{Display, Event, SampleInput, StimulusOutput};

use crate::acquisition::AcquisitionCycle;
use crate::config::{DisplayCfg, SweepCfg};
use crate::error::{Result, TesterError};
use crate::hw_error::map_hw_error;
use crate::report::{RunReport, StepRecord};
use crate::status::{LifecycleState, Verdict};
use crate::sweep::SweepController;

/// Unified core for both dynamic (boxed) and generic (static dispatch) variants.
pub struct TesterCore<O: StimulusOutput, I: SampleInput, D: Display> {
    pub(crate) sweep: SweepController<O>,
    pub(crate) acquisition: AcquisitionCycle<I>,
    pub(crate) display: D,
    pub(crate) cfg: SweepCfg,
    pub(crate) texts: DisplayCfg,
    pub(crate) state: LifecycleState,
    pub(crate) report: RunReport,
    pub(crate) runs_started: u64,
    pub(crate) ignored_events: u64,
}

impl<O: StimulusOutput, I: SampleInput, D: Display> core::fmt::Debug for TesterCore<O, I, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TesterCore")
            .field("state", &self.state)
            .field("level", &self.sweep.level())
            .field("steps", &self.report.steps.len())
            .field("runs_started", &self.runs_started)
            .finish()
    }
}

impl<O: StimulusOutput, I: SampleInput, D: Display> TesterCore<O, I, D> {
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn sweep_cfg(&self) -> &SweepCfg {
        &self.cfg
    }

    /// Current or most recent run. Reset when the next run starts.
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Current stimulus level.
    pub fn level(&self) -> u32 {
        self.sweep.level()
    }

    pub fn runs_started(&self) -> u64 {
        self.runs_started
    }

    /// Events dropped because the lifecycle could not accept them
    /// (masked presses, stale results after a halt).
    pub fn ignored_events(&self) -> u64 {
        self.ignored_events
    }

    pub fn output(&self) -> &O {
        self.sweep.output()
    }

    pub fn input(&self) -> &I {
        self.acquisition.input()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Handle one peripheral event and return the resulting state.
    ///
    /// Errors are hardware failures or out-of-order events. An out-of-order
    /// event leaves the state untouched. A hardware failure while the run is
    /// still in progress aborts it back to `Idle`, so the next press starts a
    /// fresh run; a failure after the verdict was recorded keeps the verdict.
    pub fn handle(&mut self, event: Event) -> Result<LifecycleState> {
        if let Err(e) = self.dispatch(event) {
            if self.state == LifecycleState::Running && !is_out_of_order(&e) {
                self.abort(&e);
            }
            return Err(e);
        }
        Ok(self.state)
    }

    fn dispatch(&mut self, event: Event) -> Result<()> {
        match (self.state, event) {
            (LifecycleState::Idle, Event::ButtonPressed) => self.start_run()?,
            (LifecycleState::Running, Event::ButtonPressed) => {
                self.ignore(event, "button masked while running");
            }
            (LifecycleState::Halted(_), Event::ButtonPressed) => self.clear()?,
            (LifecycleState::Running, Event::StimulusSettled) => {
                self.acquisition.on_stimulus_settled()?;
            }
            (LifecycleState::Running, Event::SampleReady(value)) => {
                if let Some(median) = self.acquisition.on_sample_ready(value)? {
                    self.on_median(median)?;
                }
            }
            (LifecycleState::Idle | LifecycleState::Halted(_), _) => {
                self.ignore(event, "stale event outside a run");
            }
        }
        Ok(())
    }

    /// Drop the run in progress after a peripheral failure.
    fn abort(&mut self, error: &eyre::Report) {
        self.acquisition.cancel();
        self.state = LifecycleState::Idle;
        self.report.advances = self.sweep.advances();
        tracing::warn!(
            run = self.runs_started,
            level = self.sweep.level(),
            steps = self.report.steps.len(),
            error = %format!("{error:#}"),
            "run aborted"
        );
        if let Err(e) = self.display.clear() {
            tracing::warn!(error = %e, "display clear after abort failed");
        }
    }

    /// Reset and start a sweep at level 0.
    fn start_run(&mut self) -> Result<()> {
        self.runs_started = self.runs_started.saturating_add(1);
        self.report = RunReport::with_capacity(self.cfg.levels() as usize);
        self.acquisition.reset();
        self.state = LifecycleState::Running;
        tracing::info!(
            run = self.runs_started,
            reference_max = self.cfg.reference_max,
            step_size = self.cfg.step_size,
            sample_count = self.cfg.sample_count,
            "run start"
        );

        let wait = self.texts.wait_text.clone();
        self.write_display(Some(&wait))?;
        self.sweep.reset().wrap_err("start sweep")
    }

    /// Decide on one step's median: fail, advance, or pass.
    fn on_median(&mut self, median: i32) -> Result<()> {
        let record = StepRecord {
            step: self.report.steps.len() as u32,
            level: self.sweep.level(),
            median,
        };
        self.report.steps.push(record);
        tracing::debug!(
            step = record.step,
            level = record.level,
            median,
            "step median"
        );

        // Magnitude, so an inverted converter still trips the limit.
        if median.unsigned_abs() >= self.cfg.fail_threshold {
            return self.halt(Verdict::Fail);
        }
        if !self.sweep.at_maximum() {
            self.sweep.advance()?;
            self.report.advances = self.sweep.advances();
            return Ok(());
        }
        self.halt(Verdict::Pass)
    }

    fn halt(&mut self, verdict: Verdict) -> Result<()> {
        self.acquisition.cancel();
        self.state = LifecycleState::Halted(verdict);
        self.report.verdict = Some(verdict);
        self.report.advances = self.sweep.advances();
        match self.report.failed_at() {
            Some(at) => tracing::info!(
                %verdict,
                level = at.level,
                median = at.median,
                threshold = self.cfg.fail_threshold,
                "run halted"
            ),
            None => tracing::info!(
                %verdict,
                steps = self.report.steps.len(),
                advances = self.report.advances,
                "run halted"
            ),
        }

        let text = match verdict {
            Verdict::Pass => self.texts.pass_text.clone(),
            Verdict::Fail => self.texts.fail_text.clone(),
        };
        self.write_display(Some(&text))
    }

    /// Acknowledge the verdict and return to idle.
    fn clear(&mut self) -> Result<()> {
        self.state = LifecycleState::Idle;
        tracing::info!("cleared");
        self.write_display(None)
    }

    fn write_display(&mut self, text: Option<&str>) -> Result<()> {
        self.display
            .clear()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("clear display")?;
        if let Some(text) = text {
            self.display
                .show_text(text)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err_with(|| format!("show {text:?}"))?;
        }
        Ok(())
    }

    fn ignore(&mut self, event: Event, why: &'static str) {
        self.ignored_events = self.ignored_events.saturating_add(1);
        tracing::debug!(event = event.name(), state = self.state.name(), why, "event ignored");
    }
}

fn is_out_of_order(e: &eyre::Report) -> bool {
    matches!(
        e.downcast_ref::<TesterError>(),
        Some(TesterError::OutOfOrder { .. })
    )
}
