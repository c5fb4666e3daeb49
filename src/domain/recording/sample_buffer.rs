//! Reusable 16-bit sample buffer

/// Fixed-capacity buffer of signed 16-bit samples, reused every drain cycle.
#[derive(Debug)]
pub struct SampleBuffer {
    samples: Box<[i16]>,
    len: usize,
    bytes: Vec<u8>,
}

impl SampleBuffer {
    /// Default capacity in samples
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: vec![0i16; capacity].into_boxed_slice(),
            len: 0,
            bytes: Vec::with_capacity(capacity * 2),
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whole backing storage, for a source to fill
    pub fn spare_mut(&mut self) -> &mut [i16] {
        &mut self.samples
    }

    /// Record how many samples the last fill produced (clamped to capacity)
    pub fn set_filled(&mut self, count: usize) {
        self.len = count.min(self.samples.len());
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples[..self.len]
    }

    /// Filled samples as raw little-endian bytes
    pub fn as_le_bytes(&mut self) -> &[u8] {
        self.bytes.clear();
        for sample in &self.samples[..self.len] {
            self.bytes.extend_from_slice(&sample.to_le_bytes());
        }
        &self.bytes
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
