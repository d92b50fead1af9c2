//! Peripheral collaborator contracts for the sweep tester.
//!
//! The core never talks to registers. It issues requests through these traits
//! and learns about completions through [`Event`]s that the peripherals push
//! into an [`EventSink`].
pub mod event;

pub use event::{Event, EventSink, event_channel};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Programmable output driving the device under test.
pub trait StimulusOutput {
    /// Issue `level` (in sweep units, `0..=reference_max`).
    ///
    /// Must not block on conversion; emit [`Event::StimulusSettled`] once the
    /// output has settled.
    fn set_level(&mut self, level: u32) -> Result<(), BoxError>;
}

/// Converter sampling the downstream signal.
pub trait SampleInput {
    /// Start one conversion; the result arrives as [`Event::SampleReady`].
    fn request_sample(&mut self) -> Result<(), BoxError>;
}

/// Text display showing progress and the verdict.
pub trait Display {
    fn clear(&mut self) -> Result<(), BoxError>;
    fn show_text(&mut self, text: &str) -> Result<(), BoxError>;
}

impl<T: StimulusOutput + ?Sized> StimulusOutput for Box<T> {
    fn set_level(&mut self, level: u32) -> Result<(), BoxError> {
        (**self).set_level(level)
    }
}

impl<T: SampleInput + ?Sized> SampleInput for Box<T> {
    fn request_sample(&mut self) -> Result<(), BoxError> {
        (**self).request_sample()
    }
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn clear(&mut self) -> Result<(), BoxError> {
        (**self).clear()
    }
    fn show_text(&mut self, text: &str) -> Result<(), BoxError> {
        (**self).show_text(text)
    }
}
