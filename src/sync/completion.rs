//! Completion bridge.
//!
//! Runs in the transfer engine's interrupt. It clears the pending hardware
//! condition first so the interrupt cannot re-fire, then posts an event bit
//! for the waiting task. A transfer error latches the channel as faulted and
//! raises the fatal indicator; the latch is only cleared by
//! [`StreamChannel::reset`](crate::driver::channel::StreamChannel::reset).
//!
//! Nothing here blocks or takes a lock a task could be holding: event flags
//! and the latch are atomics, and status indicators are required to be
//! interrupt safe.

use core::sync::atomic::{AtomicBool, Ordering};

use super::signal::{EventFlags, event};
use crate::driver::interrupt::TransferStatus;
use crate::hal::status::{Indicator, StatusIndicator};
use crate::hal::transfer::TransferInterrupt;
use crate::internal::fmt::{log_error, log_trace};

/// Sticky "channel faulted" flag shared by the interrupt and the channel owner
#[derive(Debug, Default)]
pub struct FaultLatch {
    faulted: AtomicBool,
}

impl FaultLatch {
    /// Not faulted
    pub const fn new() -> Self {
        Self {
            faulted: AtomicBool::new(false),
        }
    }

    /// Latch the fault
    #[inline]
    pub fn trip(&self) {
        self.faulted.store(true, Ordering::Release);
    }

    /// Whether a fault is latched
    #[inline]
    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }

    pub(crate) fn clear(&self) {
        self.faulted.store(false, Ordering::Release);
    }
}

/// What the bridge did with one interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Completion {
    /// Nothing pending for this channel
    Spurious,
    /// Chain finished, `CHAIN_DONE` posted
    Done,
    /// Hardware error, channel latched, `CHAIN_ERROR` posted
    Faulted,
}

/// Folds transfer engine interrupts back into task-level events
pub struct CompletionBridge<'a, S: StatusIndicator> {
    channel: u8,
    events: &'a EventFlags,
    latch: &'a FaultLatch,
    status: &'a S,
}

impl<'a, S: StatusIndicator> CompletionBridge<'a, S> {
    /// Bridge for engine channel `channel`
    pub const fn new(
        channel: u8,
        events: &'a EventFlags,
        latch: &'a FaultLatch,
        status: &'a S,
    ) -> Self {
        Self {
            channel,
            events,
            latch,
            status,
        }
    }

    /// Handle one interrupt. Call from the engine's interrupt handler.
    pub fn on_interrupt<I: TransferInterrupt>(&self, irq: &mut I) -> Completion {
        let pending = irq.pending();
        let ours = TransferStatus {
            done_mask: pending.done_mask & (1 << (self.channel & 0x7)),
            error: pending.error,
        };
        if !ours.any() {
            return Completion::Spurious;
        }

        irq.clear(ours);

        if ours.has_error() {
            self.latch.trip();
            self.status.raise(Indicator::Fatal);
            self.events.set(event::CHAIN_ERROR);
            log_error!("transfer error on channel {}, channel halted", self.channel);
            Completion::Faulted
        } else {
            self.events.set(event::CHAIN_DONE);
            log_trace!("chain done on channel {}", self.channel);
            Completion::Done
        }
    }
}
