//! Frames and samples.
//!
//! Wire layout: bytes 0..4 hold the sequence number, big-endian; the rest
//! is a run of three-axis samples, each axis a big-endian `u16`.

use crate::driver::error::{IoError, IoResult};
use crate::internal::constants::{MAX_FRAME_LEN, SAMPLE_UNIT_LEN, SEQ_LEN, Z_MARKER};

/// One three-axis sample unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisSample {
    /// X axis
    pub x: u16,
    /// Y axis
    pub y: u16,
    /// Z axis
    pub z: u16,
}

impl AxisSample {
    /// Wire representation
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; SAMPLE_UNIT_LEN] {
        let [x0, x1] = self.x.to_be_bytes();
        let [y0, y1] = self.y.to_be_bytes();
        let [z0, z1] = self.z.to_be_bytes();
        [x0, x1, y0, y1, z0, z1]
    }

    /// Parse one unit from the wire
    #[must_use]
    pub fn from_be_bytes(bytes: [u8; SAMPLE_UNIT_LEN]) -> Self {
        Self {
            x: u16::from_be_bytes([bytes[0], bytes[1]]),
            y: u16::from_be_bytes([bytes[2], bytes[3]]),
            z: u16::from_be_bytes([bytes[4], bytes[5]]),
        }
    }
}

/// Producer of samples for the generator
pub trait SampleSource {
    /// Next sample unit
    fn next_sample(&mut self) -> AxisSample;
}

/// Synthetic source: `x` counts up from 0, `y` counts down from `0xFFFF`,
/// `z` stays at the marker value 127. Both counters wrap.
#[derive(Debug, Clone)]
pub struct CounterSource {
    x: u16,
    y: u16,
}

impl Default for CounterSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource {
    /// Source at its initial counter values
    pub const fn new() -> Self {
        Self { x: 0, y: u16::MAX }
    }
}

impl SampleSource for CounterSource {
    fn next_sample(&mut self) -> AxisSample {
        let sample = AxisSample {
            x: self.x,
            y: self.y,
            z: Z_MARKER,
        };
        self.x = self.x.wrapping_add(1);
        self.y = self.y.wrapping_sub(1);
        sample
    }
}

/// Sequence number of a wire frame, if it is long enough to carry one
#[must_use]
pub fn read_sequence(bytes: &[u8]) -> Option<u32> {
    let seq: [u8; SEQ_LEN] = bytes.get(..SEQ_LEN)?.try_into().ok()?;
    Some(u32::from_be_bytes(seq))
}

/// Iterate the complete sample units of a frame's payload
pub fn samples(payload: &[u8]) -> impl Iterator<Item = AxisSample> + '_ {
    payload.chunks_exact(SAMPLE_UNIT_LEN).map(|chunk| {
        let mut unit = [0u8; SAMPLE_UNIT_LEN];
        unit.copy_from_slice(chunk);
        AxisSample::from_be_bytes(unit)
    })
}

/// Frame buffer, word aligned for the transfer engine
#[repr(C, align(4))]
#[derive(Debug, Clone)]
pub struct Frame<const CAP: usize = MAX_FRAME_LEN> {
    bytes: [u8; CAP],
    len: usize,
}

impl<const CAP: usize> Default for Frame<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> Frame<CAP> {
    /// Empty frame
    pub const fn new() -> Self {
        const { assert!(CAP >= SEQ_LEN, "frame must hold a sequence number") };

        Self {
            bytes: [0; CAP],
            len: 0,
        }
    }

    /// Drop all samples and stamp `seq`
    pub fn restart(&mut self, seq: u32) {
        self.bytes[..SEQ_LEN].copy_from_slice(&seq.to_be_bytes());
        self.len = SEQ_LEN;
    }

    /// Append one sample unit
    pub fn push_sample(&mut self, sample: AxisSample) -> IoResult<()> {
        let end = self.len + SAMPLE_UNIT_LEN;
        if self.len < SEQ_LEN || end > CAP {
            return Err(IoError::FrameTooLarge);
        }
        self.bytes[self.len..end].copy_from_slice(&sample.to_be_bytes());
        self.len = end;
        Ok(())
    }

    /// Stamped sequence number
    pub fn sequence(&self) -> Option<u32> {
        read_sequence(self.as_bytes())
    }

    /// Sample units written so far
    pub fn sample_count(&self) -> usize {
        self.len.saturating_sub(SEQ_LEN) / SAMPLE_UNIT_LEN
    }

    /// Whole frame as it goes on the wire
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Bytes after the sequence number
    pub fn payload(&self) -> &[u8] {
        self.as_bytes().get(SEQ_LEN..).unwrap_or(&[])
    }

    /// Bytes written, sequence number included
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been stamped yet
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buffer size
    pub const fn capacity(&self) -> usize {
        CAP
    }
}
