use std::time::{Duration, Instant};

use rppal::gpio::{Gpio, InputPin, Trigger};
use tester_traits::{Event, EventSink};

use crate::error::{HwError, Result};
use crate::util::Debounce;

/// Start/reset button on a GPIO line, edge-triggered.
///
/// The interrupt thread owned by `rppal` raises [`Event::ButtonPressed`] for
/// every edge outside the debounce window; dropping the button disarms it.
pub struct GpioButton {
    pin: InputPin,
}

impl GpioButton {
    pub fn new(bcm_pin: u8, active_low: bool, debounce: Duration, sink: EventSink) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = gpio.get(bcm_pin).map_err(|e| HwError::Gpio(e.to_string()))?;
        let (mut pin, trigger) = if active_low {
            (pin.into_input_pullup(), Trigger::FallingEdge)
        } else {
            (pin.into_input_pulldown(), Trigger::RisingEdge)
        };
        let mut debounce_gate = Debounce::new(debounce);
        // rppal debounce off; `debounce_gate` filters edges.
        pin.set_async_interrupt(trigger, None, move |_edge| {
            if !debounce_gate.accept(Instant::now()) {
                tracing::trace!("button bounce dropped");
                return;
            }
            if sink.emit(Event::ButtonPressed).is_err() {
                tracing::warn!("button press dropped: event receiver gone");
            }
        })
        .map_err(|e| HwError::Gpio(e.to_string()))?;
        tracing::info!(
            pin = bcm_pin,
            active_low,
            ?debounce,
            "button armed"
        );
        Ok(Self { pin })
    }
}

impl Drop for GpioButton {
    fn drop(&mut self) {
        if let Err(e) = self.pin.clear_async_interrupt() {
            tracing::warn!(error = %e, "failed to disarm button interrupt");
        }
    }
}
