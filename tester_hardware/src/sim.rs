//! In-process bench: simulated DAC, ADC, display and button.
//!
//! The DAC and ADC share an [`AnalogNode`] standing in for the wire between
//! the converter output and the device under test. Every peripheral raises
//! its completion event synchronously, so the event queue sees exactly the
//! order a real interrupt-driven bench would produce.
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tester_traits::{BoxError, Display, Event, EventSink, SampleInput, StimulusOutput};

use crate::device::DeviceModel;
use crate::util::{emit, level_to_code};

/// Shared stimulus level between output and input.
#[derive(Debug, Clone, Default)]
pub struct AnalogNode {
    level: Arc<AtomicU32>,
}

impl AnalogNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, level: u32) {
        self.level.store(level, Ordering::SeqCst);
    }

    pub fn get(&self) -> u32 {
        self.level.load(Ordering::SeqCst)
    }
}

/// Simulated DAC.
#[derive(Debug)]
pub struct SimDac {
    node: AnalogNode,
    sink: EventSink,
    reference_max: u32,
    bits: u8,
    last_code: Option<u16>,
    writes: u64,
}

impl SimDac {
    pub fn new(node: AnalogNode, sink: EventSink, reference_max: u32, bits: u8) -> Self {
        Self {
            node,
            sink,
            reference_max,
            bits,
            last_code: None,
            writes: 0,
        }
    }

    pub fn last_code(&self) -> Option<u16> {
        self.last_code
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl StimulusOutput for SimDac {
    fn set_level(&mut self, level: u32) -> Result<(), BoxError> {
        let code = level_to_code(level, self.reference_max, self.bits);
        self.node.set(level);
        self.last_code = Some(code);
        self.writes += 1;
        tracing::trace!(level, code, "dac write");
        emit(&self.sink, Event::StimulusSettled)?;
        Ok(())
    }
}

/// Simulated ADC reading the node through a device model.
#[derive(Debug)]
pub struct SimAdc {
    node: AnalogNode,
    sink: EventSink,
    device: DeviceModel,
    full_scale: i32,
    conversions: u64,
}

impl SimAdc {
    pub fn new(node: AnalogNode, sink: EventSink, device: DeviceModel, full_scale: i32) -> Self {
        Self {
            node,
            sink,
            device,
            full_scale: full_scale.max(0),
            conversions: 0,
        }
    }

    pub fn conversions(&self) -> u64 {
        self.conversions
    }
}

impl SampleInput for SimAdc {
    fn request_sample(&mut self) -> Result<(), BoxError> {
        let level = self.node.get();
        let raw = self.device.sample(level).clamp(0, self.full_scale);
        self.conversions += 1;
        tracing::trace!(level, raw, "adc conversion");
        emit(&self.sink, Event::SampleReady(raw))?;
        Ok(())
    }
}

/// Inspection handle onto a [`SimDisplay`].
#[derive(Debug, Clone, Default)]
pub struct DisplayHandle {
    inner: Arc<Mutex<DisplayState>>,
}

#[derive(Debug, Default)]
struct DisplayState {
    text: String,
    writes: Vec<String>,
}

impl DisplayHandle {
    /// Text currently shown; empty after a clear.
    pub fn text(&self) -> String {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .text
            .clone()
    }

    /// Every `show_text` payload in order.
    pub fn writes(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .writes
            .clone()
    }
}

type Observer = Box<dyn FnMut(&str) + Send>;

/// Simulated character display.
pub struct SimDisplay {
    handle: DisplayHandle,
    observer: Option<Observer>,
}

impl std::fmt::Debug for SimDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimDisplay")
            .field("handle", &self.handle)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Default for SimDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDisplay {
    pub fn new() -> Self {
        Self {
            handle: DisplayHandle::default(),
            observer: None,
        }
    }

    /// Call `f` with the new contents after every change.
    pub fn with_observer(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.observer = Some(Box::new(f));
        self
    }

    pub fn handle(&self) -> DisplayHandle {
        self.handle.clone()
    }

    fn update(&mut self, text: &str, record: bool) {
        {
            let mut st = self
                .handle
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            st.text.clear();
            st.text.push_str(text);
            if record {
                st.writes.push(text.to_string());
            }
        }
        if let Some(f) = self.observer.as_mut() {
            f(text);
        }
    }
}

impl Display for SimDisplay {
    fn clear(&mut self) -> Result<(), BoxError> {
        tracing::trace!("display clear");
        self.update("", false);
        Ok(())
    }

    fn show_text(&mut self, text: &str) -> Result<(), BoxError> {
        tracing::trace!(text, "display write");
        self.update(text, true);
        Ok(())
    }
}

/// Simulated start/reset button.
#[derive(Debug, Clone)]
pub struct SimButton {
    sink: EventSink,
}

impl SimButton {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }

    pub fn press(&self) -> crate::error::Result<()> {
        tracing::trace!("button press");
        emit(&self.sink, Event::ButtonPressed)
    }
}
