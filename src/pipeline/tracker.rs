//! Sequence and content loss detection.
//!
//! [`LossTracker`] compares consecutive sequence numbers; a wrap at the
//! counter width is the one expected non-contiguous step. [`ContentCheck`]
//! is a heuristic on the sample values and is advisory only: it can miss
//! losses and can flag frames that are fine.

use super::frame::{AxisSample, samples};
use crate::driver::config::SequenceWidth;
use crate::internal::constants::Z_MARKER;

/// Whether `new` is anything but the direct successor of `prev`
#[inline]
pub const fn is_gap(width: SequenceWidth, prev: u32, new: u32) -> bool {
    new != width.next(prev)
}

/// Result of observing one sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceCheck {
    /// Nothing to compare against yet
    First,
    /// Direct successor
    InOrder,
    /// Sequence jumped; `missing` frames in between (modulo the counter width)
    Gap {
        /// Number of skipped sequence numbers
        missing: u32,
    },
}

impl SequenceCheck {
    /// Whether this observation indicates loss
    pub const fn is_loss(self) -> bool {
        matches!(self, Self::Gap { .. })
    }
}

/// Tracks the last accepted sequence number
#[derive(Debug, Clone)]
pub struct LossTracker {
    width: SequenceWidth,
    previous: Option<u32>,
}

impl LossTracker {
    /// Tracker for counters of `width`
    pub const fn new(width: SequenceWidth) -> Self {
        Self {
            width,
            previous: None,
        }
    }

    /// Last accepted sequence number
    pub fn previous(&self) -> Option<u32> {
        self.previous
    }

    /// Compare `seq` with the previous one and accept it.
    pub fn observe(&mut self, seq: u32) -> SequenceCheck {
        let seq = seq & self.width.max();
        let check = match self.previous {
            None => SequenceCheck::First,
            Some(prev) if !is_gap(self.width, prev, seq) => SequenceCheck::InOrder,
            Some(prev) => SequenceCheck::Gap {
                missing: seq.wrapping_sub(prev).wrapping_sub(1) & self.width.max(),
            },
        };
        self.previous = Some(seq);
        check
    }

    /// Forget the previous number
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// Plausibility check on counter-source payloads.
///
/// Expects `x` to continue from the previous frame and to count up by one
/// per sample, and `z` to carry the marker value on the first and last
/// sample.
#[derive(Debug, Clone, Default)]
pub struct ContentCheck {
    last_x: Option<u16>,
}

impl ContentCheck {
    /// No history
    pub const fn new() -> Self {
        Self { last_x: None }
    }

    /// Inspect one payload (sequence number already stripped).
    ///
    /// Returns `false` when the samples look wrong. An empty payload is
    /// implausible but leaves the history untouched.
    pub fn inspect(&mut self, payload: &[u8]) -> bool {
        let count = samples(payload).count();
        let (Some(first), Some(last)) = (samples(payload).next(), samples(payload).last()) else {
            return false;
        };

        let continuous = self
            .last_x
            .is_none_or(|prev| first.x == prev.wrapping_add(1));
        let contiguous = last.x == first.x.wrapping_add(count as u16 - 1);
        let marked = Self::marked(first) && Self::marked(last);

        self.last_x = Some(last.x);
        continuous && contiguous && marked
    }

    fn marked(sample: AxisSample) -> bool {
        sample.z == Z_MARKER
    }
}
