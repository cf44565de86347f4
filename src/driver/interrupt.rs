//! Transfer engine interrupt status.
//!
//! This module provides [`TransferStatus`], parsed from the engine's
//! interrupt flag register: one DONE bit per channel and a shared error bit.

use crate::internal::descriptor_bits::intflag;

// =============================================================================
// Transfer Status
// =============================================================================

/// Interrupt flags parsed from the transfer engine.
///
/// ```ignore
/// let status = engine.pending();
/// engine.clear(status);
/// if status.has_error() {
///     // channel state is no longer trustworthy
/// } else if status.done(channel) {
///     // chain finished
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferStatus {
    /// Per-channel DONE bits (bit n = channel n)
    pub done_mask: u8,
    /// Transfer error (bus fault or malformed descriptor)
    pub error: bool,
}

impl TransferStatus {
    /// Create from the raw interrupt flag register
    #[inline]
    pub fn from_raw(flags: u32) -> Self {
        Self {
            done_mask: (flags & intflag::DONE_MASK) as u8,
            error: (flags & intflag::ERROR) != 0,
        }
    }

    /// Convert to raw value for clearing (write-1-to-clear)
    #[inline]
    pub fn to_raw(&self) -> u32 {
        let mut val = u32::from(self.done_mask);
        if self.error {
            val |= intflag::ERROR;
        }
        val
    }

    /// Status carrying only the DONE bit of one channel
    #[inline]
    pub fn done_for(channel: u8) -> Self {
        Self::from_raw(intflag::done(channel))
    }

    /// Status carrying only the error bit
    #[inline]
    pub const fn error_only() -> Self {
        Self {
            done_mask: 0,
            error: true,
        }
    }

    /// Whether the given channel completed
    #[inline]
    pub fn done(&self, channel: u8) -> bool {
        (u32::from(self.done_mask) & intflag::done(channel)) != 0
    }

    /// Check if any flag is set
    #[inline]
    pub fn any(&self) -> bool {
        self.done_mask != 0 || self.error
    }

    /// Check if the error flag is set
    #[inline]
    pub fn has_error(&self) -> bool {
        self.error
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_zero() {
        let status = TransferStatus::from_raw(0);
        assert!(!status.any());
        assert!(!status.has_error());
        assert_eq!(status, TransferStatus::default());
    }

    #[test]
    fn from_raw_done_channel() {
        let status = TransferStatus::from_raw(intflag::done(1));
        assert!(status.done(1));
        assert!(!status.done(0));
        assert!(!status.has_error());
        assert!(status.any());
    }

    #[test]
    fn from_raw_error() {
        let status = TransferStatus::from_raw(intflag::ERROR);
        assert!(status.has_error());
        assert!(status.any());
        assert_eq!(status.done_mask, 0);
    }

    #[test]
    fn ignores_reserved_bits() {
        let status = TransferStatus::from_raw(0x0F00);
        assert!(!status.any());
        assert_eq!(status.to_raw(), 0);
    }

    #[test]
    fn to_raw_roundtrip() {
        let raw = intflag::done(0) | intflag::done(5) | intflag::ERROR;
        assert_eq!(TransferStatus::from_raw(raw).to_raw(), raw);
    }

    #[test]
    fn constructors() {
        assert!(TransferStatus::done_for(3).done(3));
        assert!(!TransferStatus::done_for(3).has_error());
        assert!(TransferStatus::error_only().has_error());
        assert_eq!(TransferStatus::error_only().to_raw(), intflag::ERROR);
    }
}
