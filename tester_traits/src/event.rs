use crossbeam_channel as xch;

use crate::BoxError;

/// Asynchronous completion reported by a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Falling edge on the start/reset button.
    ButtonPressed,
    /// The output finished converting the last issued level.
    StimulusSettled,
    /// One input conversion finished with this raw reading.
    SampleReady(i32),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ButtonPressed => "button_pressed",
            Event::StimulusSettled => "stimulus_settled",
            Event::SampleReady(_) => "sample_ready",
        }
    }
}

/// Cloneable handle peripherals use to raise events.
///
/// Events are queued in arrival order and handled one at a time by whoever
/// owns the matching receiver.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: xch::Sender<Event>,
}

impl EventSink {
    pub fn new(tx: xch::Sender<Event>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, event: Event) -> Result<(), BoxError> {
        self.tx
            .send(event)
            .map_err(|_| -> BoxError { Box::new(std::io::Error::other("event receiver disconnected")) })
    }
}

/// Create a connected sink/receiver pair.
pub fn event_channel() -> (EventSink, xch::Receiver<Event>) {
    let (tx, rx) = xch::unbounded();
    (EventSink::new(tx), rx)
}
