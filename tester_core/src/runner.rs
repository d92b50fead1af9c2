//! Event loop feeding peripheral events into the tester one at a time.
//!
//! Blocking on the event channel is the only suspension point: every handler
//! runs to completion, and events are handled in the order they were raised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel as xch;
use tester_traits::{Display, Event, SampleInput, StimulusOutput};

use crate::core::TesterCore;
use crate::error::{Result, TesterError};
use crate::report::RunReport;
use crate::status::LifecycleState;

/// How often `serve` re-checks its shutdown flag while no events arrive.
pub const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

pub struct EventLoop<O: StimulusOutput, I: SampleInput, D: Display> {
    tester: TesterCore<O, I, D>,
    events: xch::Receiver<Event>,
}

impl<O: StimulusOutput, I: SampleInput, D: Display> EventLoop<O, I, D> {
    pub fn new(tester: TesterCore<O, I, D>, events: xch::Receiver<Event>) -> Self {
        Self { tester, events }
    }

    pub fn tester(&self) -> &TesterCore<O, I, D> {
        &self.tester
    }

    pub fn into_tester(self) -> TesterCore<O, I, D> {
        self.tester
    }

    /// Handle one event. Returns `Some(report)` when it completed a run.
    pub fn dispatch(&mut self, event: Event) -> Result<Option<RunReport>> {
        let before = self.tester.state();
        let after = self.tester.handle(event)?;
        if before == LifecycleState::Running && after.verdict().is_some() {
            return Ok(Some(self.tester.report().clone()));
        }
        Ok(None)
    }

    /// Wait for a button press to start a run, drive it to a verdict, and return its report.
    ///
    /// There is no timeout: a peripheral that never completes stalls the run.
    pub fn run_once(&mut self) -> Result<RunReport> {
        loop {
            let event = self
                .events
                .recv()
                .map_err(|_| eyre::Report::new(TesterError::Disconnected))?;
            if let Some(report) = self.dispatch(event)? {
                return Ok(report);
            }
        }
    }

    /// Handle every event already queued without blocking.
    ///
    /// Returns the reports of runs completed along the way.
    pub fn drain_pending(&mut self) -> Result<Vec<RunReport>> {
        let mut reports = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if let Some(report) = self.dispatch(event)? {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    /// Service events until `shutdown` is set or every event source is gone.
    ///
    /// Once `shutdown` is seen, events already queued are still handled before
    /// returning. `on_report` is called once per completed run; the return value
    /// is the number of runs completed. Losing the event source in the middle of
    /// a run is an error.
    pub fn serve<F>(&mut self, shutdown: &AtomicBool, mut on_report: F) -> Result<u64>
    where
        F: FnMut(&RunReport),
    {
        let mut completed = 0u64;
        loop {
            let event = if shutdown.load(Ordering::SeqCst) {
                match self.events.try_recv() {
                    Ok(event) => event,
                    Err(_) => {
                        tracing::debug!(completed, "event loop shutdown requested");
                        return Ok(completed);
                    }
                }
            } else {
                match self.events.recv_timeout(SHUTDOWN_POLL) {
                    Ok(event) => event,
                    Err(xch::RecvTimeoutError::Timeout) => continue,
                    Err(xch::RecvTimeoutError::Disconnected) => {
                        if self.tester.state() == LifecycleState::Running {
                            return Err(eyre::Report::new(TesterError::Disconnected));
                        }
                        tracing::debug!(completed, "event sources closed");
                        return Ok(completed);
                    }
                }
            };
            if let Some(report) = self.dispatch(event)? {
                completed += 1;
                on_report(&report);
            }
        }
    }
}
