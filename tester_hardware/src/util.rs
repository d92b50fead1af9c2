use std::time::{Duration, Instant};

use tester_traits::{Event, EventSink};

use crate::error::{HwError, Result};

/// Poll `is_ready` until it returns true or `timeout` expires.
/// Sleeps `poll_interval` between probes.
pub fn wait_until_ready_with_timeout(
    mut is_ready: impl FnMut() -> Result<bool>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while !is_ready()? {
        if Instant::now() >= deadline {
            return Err(HwError::Timeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}

/// Emit `event`, reporting a closed receiver as [`HwError::Disconnected`].
pub fn emit(sink: &EventSink, event: Event) -> Result<()> {
    sink.emit(event).map_err(|_| HwError::Disconnected)
}

/// Drops edges that land within `window` of the last accepted one.
///
/// A window of zero accepts every edge.
#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    last: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Whether an edge seen at `now` is a new press. Rejected edges do not
    /// extend the window.
    pub fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}

/// Convert a stimulus level to an output code of `bits` resolution.
///
/// `code = level * 2^bits / reference_max`, saturating at `2^bits - 1`.
pub fn level_to_code(level: u32, reference_max: u32, bits: u8) -> u16 {
    let bits = bits.clamp(1, 16);
    let full = 1u64 << bits;
    let code = u64::from(level) * full / u64::from(reference_max.max(1));
    u16::try_from(code.min(full - 1)).unwrap_or(u16::MAX)
}
