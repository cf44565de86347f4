//! Status indicators
//!
//! A small, write-only set of discrete indicators toggled on contention,
//! loss, fatal transfer errors and activity. Indicator methods take `&self`
//! and never block, so they can be driven from interrupt context.

use core::sync::atomic::{AtomicU8, Ordering};

use embedded_hal::digital::OutputPin;

use crate::sync::CriticalSectionCell;

/// Discrete status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Indicator {
    /// Slot or engine unavailable within the bounded wait
    Contention = 0,
    /// Sequence gap or implausible content detected
    Loss = 1,
    /// Hardware transfer error; channel halted
    Fatal = 2,
    /// Frame forwarded or sent
    Activity = 3,
}

impl Indicator {
    /// Number of indicators
    pub const COUNT: usize = 4;

    /// Bit of this indicator in a [`StatusFlags`] snapshot
    #[must_use]
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Trait for the status/diagnostic channel
pub trait StatusIndicator {
    /// Turn the indicator on
    fn raise(&self, indicator: Indicator);

    /// Flip the indicator
    fn toggle(&self, indicator: Indicator);
}

impl<T: StatusIndicator + ?Sized> StatusIndicator for &T {
    fn raise(&self, indicator: Indicator) {
        (**self).raise(indicator);
    }

    fn toggle(&self, indicator: Indicator) {
        (**self).toggle(indicator);
    }
}

// =============================================================================
// Atomic Flags
// =============================================================================

/// Indicators kept as atomic bits
#[derive(Debug, Default)]
pub struct StatusFlags {
    bits: AtomicU8,
}

impl StatusFlags {
    /// All indicators off
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    /// Whether the indicator is on
    pub fn is_raised(&self, indicator: Indicator) -> bool {
        self.bits.load(Ordering::Acquire) & indicator.bit() != 0
    }

    /// Raw bits (see [`Indicator::bit`])
    pub fn snapshot(&self) -> u8 {
        self.bits.load(Ordering::Acquire)
    }

    /// Turn every indicator off
    pub fn clear(&self) {
        self.bits.store(0, Ordering::Release);
    }
}

impl StatusIndicator for StatusFlags {
    fn raise(&self, indicator: Indicator) {
        self.bits.fetch_or(indicator.bit(), Ordering::AcqRel);
    }

    fn toggle(&self, indicator: Indicator) {
        self.bits.fetch_xor(indicator.bit(), Ordering::AcqRel);
    }
}

// =============================================================================
// LED Adapter
// =============================================================================

struct LedBank<P> {
    pins: [P; Indicator::COUNT],
    lit: u8,
}

/// Drives one [`OutputPin`] per indicator, active high.
///
/// Pin errors are ignored; the status channel has no read-back.
pub struct LedIndicators<P: OutputPin> {
    bank: CriticalSectionCell<LedBank<P>>,
}

impl<P: OutputPin> LedIndicators<P> {
    /// Take the pins in [`Indicator`] order: contention, loss, fatal, activity.
    pub fn new(mut pins: [P; Indicator::COUNT]) -> Self {
        for pin in &mut pins {
            let _ = pin.set_low();
        }
        Self {
            bank: CriticalSectionCell::new(LedBank { pins, lit: 0 }),
        }
    }

    /// Give the pins back
    pub fn release(self) -> [P; Indicator::COUNT] {
        self.bank.into_inner().pins
    }

    fn drive(bank: &mut LedBank<P>, indicator: Indicator, on: bool) {
        let pin = &mut bank.pins[indicator as usize];
        let _ = if on { pin.set_high() } else { pin.set_low() };
        if on {
            bank.lit |= indicator.bit();
        } else {
            bank.lit &= !indicator.bit();
        }
    }
}

impl<P: OutputPin> StatusIndicator for LedIndicators<P> {
    fn raise(&self, indicator: Indicator) {
        self.bank.with(|bank| Self::drive(bank, indicator, true));
    }

    fn toggle(&self, indicator: Indicator) {
        self.bank.with(|bank| {
            let on = bank.lit & indicator.bit() == 0;
            Self::drive(bank, indicator, on);
        });
    }
}
