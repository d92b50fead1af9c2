//! Acquisition cycle: N sample requests per settled stimulus, then one median.

use eyre::WrapErr;
use tester_traits::{Event, SampleInput};

use crate::buffer::SampleBuffer;
use crate::error::{Result, TesterError};
use crate::hw_error::map_hw_error;

/// Where the cycle is within the current stimulus step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not part of a run; no events expected.
    Idle,
    /// A stimulus was issued; waiting for it to settle.
    AwaitingSettle,
    /// Sampling; `requested` requests issued this step.
    Sampling { requested: usize },
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::AwaitingSettle => "awaiting settle",
            Phase::Sampling { .. } => "sampling",
        }
    }
}

pub struct AcquisitionCycle<I: SampleInput> {
    input: I,
    buffer: SampleBuffer,
    phase: Phase,
}

impl<I: SampleInput> core::fmt::Debug for AcquisitionCycle<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AcquisitionCycle")
            .field("phase", &self.phase)
            .field("collected", &self.buffer.len())
            .field("sample_count", &self.buffer.capacity())
            .finish()
    }
}

impl<I: SampleInput> AcquisitionCycle<I> {
    pub fn new(input: I, sample_count: usize) -> Self {
        Self {
            input,
            buffer: SampleBuffer::new(sample_count),
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn sample_count(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Arm for a new run: empty buffer, wait for the first settle.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.phase = Phase::AwaitingSettle;
    }

    /// Drop any in-flight step; later events for it are stale.
    pub fn cancel(&mut self) {
        self.buffer.reset();
        self.phase = Phase::Idle;
    }

    /// Output settled: start this step's sampling.
    pub fn on_stimulus_settled(&mut self) -> Result<()> {
        if self.phase != Phase::AwaitingSettle {
            return Err(self.out_of_order(Event::StimulusSettled));
        }
        self.buffer.reset();
        self.request()?;
        self.phase = Phase::Sampling { requested: 1 };
        Ok(())
    }

    /// Store one reading; returns the step median once the buffer fills.
    ///
    /// Exactly `sample_count` requests are issued per step: the reading that
    /// fills the buffer triggers the median instead of another request.
    pub fn on_sample_ready(&mut self, value: i32) -> Result<Option<i32>> {
        let Phase::Sampling { requested } = self.phase else {
            return Err(self.out_of_order(Event::SampleReady(value)));
        };
        debug_assert!(
            self.buffer.len() < requested,
            "sample result without an outstanding request"
        );
        tracing::trace!(value, index = self.buffer.len(), "sample");
        self.buffer.push(value);

        if let Some(median) = self.buffer.median() {
            self.buffer.reset();
            self.phase = Phase::AwaitingSettle;
            return Ok(Some(median));
        }

        self.request()?;
        self.phase = Phase::Sampling {
            requested: requested + 1,
        };
        Ok(None)
    }

    fn request(&mut self) -> Result<()> {
        self.input
            .request_sample()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("request sample")
    }

    fn out_of_order(&self, event: Event) -> eyre::Report {
        eyre::Report::new(TesterError::OutOfOrder {
            event: event.name(),
            phase: self.phase.name(),
        })
    }
}
