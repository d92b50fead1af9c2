//! Fixed-capacity sample buffer with median extraction.

/// Raw readings collected for the current stimulus level only.
///
/// Invariant: `len() <= capacity()`. Cleared at the start of every step.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<i32>,
    capacity: usize,
    scratch: Vec<i32>,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "sample buffer capacity must be >= 1");
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            scratch: Vec::with_capacity(capacity),
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Append one reading.
    ///
    /// Pushing into a full buffer is a caller bug: it panics in debug builds and
    /// the value is dropped in release builds.
    pub fn push(&mut self, value: i32) {
        debug_assert!(
            !self.is_full(),
            "push on a full sample buffer (capacity {})",
            self.capacity
        );
        if self.is_full() {
            return;
        }
        self.samples.push(value);
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Readings in insertion order.
    pub fn as_slice(&self) -> &[i32] {
        &self.samples
    }

    /// Median of a full buffer; `None` until the buffer is full.
    ///
    /// Sorts a private copy, so insertion order is preserved. For an even
    /// capacity the lower of the two middle elements is returned.
    pub fn median(&mut self) -> Option<i32> {
        if !self.is_full() {
            return None;
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.samples);
        self.scratch.sort_unstable();
        Some(self.scratch[(self.capacity - 1) / 2])
    }
}
