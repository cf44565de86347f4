//! Buffer slots.
//!
//! Each slot couples a [`Frame`] with a binary ownership token and a state:
//!
//! ```text
//! Free --begin_fill--> Filling --mark_ready--> ReadyToSend --begin_send--> Sending
//!  ^                     |  ^                                                 |
//!  |                     +--+ restart_fill                                    |
//!  +-------------------------------- finish_send -----------------------------+
//! ```
//!
//! The token is held only for the duration of one step. Frame contents are
//! protected by the state: only the generator writes, and only in `Filling`;
//! in `ReadyToSend` and `Sending` the frame is read-only (the transfer engine
//! may still be reading it after the sender has dropped the token).

use core::cell::UnsafeCell;
#[cfg(test)]
use core::sync::atomic::{AtomicU8, Ordering};

use embedded_hal::delay::DelayNs;

use super::frame::Frame;
use crate::driver::config::Timeout;
use crate::driver::error::{IoError, IoResult};
use crate::internal::constants::{MAX_FRAME_LEN, POLL_INTERVAL_US};
use crate::internal::fmt::log_trace;
use crate::sync::CriticalSectionCell;

/// Slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotId(pub u8);

impl SlotId {
    /// Index into the slot array
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Ownership state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    /// Available to the generator
    #[default]
    Free,
    /// Generator is appending samples
    Filling,
    /// Complete, waiting for the sender
    ReadyToSend,
    /// Submitted; the transport may still read it
    Sending,
}

/// Pipeline role taking a slot token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Sample producer
    Generator,
    /// Frame consumer
    Sender,
}

#[derive(Debug, Clone, Copy)]
struct SlotMeta {
    state: SlotState,
    holder: Option<Role>,
    generation: u32,
}

/// One reusable frame buffer with single-owner access
pub struct BufferSlot<const CAP: usize = MAX_FRAME_LEN> {
    id: SlotId,
    meta: CriticalSectionCell<SlotMeta>,
    frame: UnsafeCell<Frame<CAP>>,
    #[cfg(test)]
    live: AtomicU8,
    #[cfg(test)]
    peak: AtomicU8,
}

// SAFETY: `frame` is only reached through a `SlotGuard`, and `meta.holder`
// admits one guard at a time. Shared reads by the transport happen only in
// `ReadyToSend`/`Sending`, where no guard may write.
unsafe impl<const CAP: usize> Sync for BufferSlot<CAP> {}

impl<const CAP: usize> BufferSlot<CAP> {
    /// Free slot with an empty frame
    pub const fn new(id: SlotId) -> Self {
        Self {
            id,
            meta: CriticalSectionCell::new(SlotMeta {
                state: SlotState::Free,
                holder: None,
                generation: 0,
            }),
            frame: UnsafeCell::new(Frame::new()),
            #[cfg(test)]
            live: AtomicU8::new(0),
            #[cfg(test)]
            peak: AtomicU8::new(0),
        }
    }

    /// Slot index
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Current state
    pub fn state(&self) -> SlotState {
        self.meta.with_ref(|m| m.state)
    }

    /// Role currently holding the token
    pub fn holder(&self) -> Option<Role> {
        self.meta.with_ref(|m| m.holder)
    }

    /// Generation of the latest `begin_send`
    pub fn send_generation(&self) -> u32 {
        self.meta.with_ref(|m| m.generation)
    }

    /// Run `f` only while send `generation` is still in flight.
    ///
    /// The check and `f` share one critical section, so a new send cannot
    /// start in between. Returns whether `f` ran.
    pub(crate) fn while_sending<F: FnOnce()>(&self, generation: u32, f: F) -> bool {
        self.meta.with(|m| {
            let current = m.state == SlotState::Sending && m.generation == generation;
            if current {
                f();
            }
            current
        })
    }

    /// Take the token if nobody holds it.
    pub fn try_acquire(&self, role: Role) -> Option<SlotGuard<'_, CAP>> {
        let taken = self.meta.with(|m| {
            if m.holder.is_some() {
                return false;
            }
            m.holder = Some(role);
            true
        });
        if !taken {
            return None;
        }
        #[cfg(test)]
        {
            let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(live, Ordering::SeqCst);
        }
        Some(SlotGuard { slot: self, role })
    }

    /// Guards alive right now
    #[cfg(test)]
    pub(crate) fn live_guards(&self) -> u8 {
        self.live.load(Ordering::SeqCst)
    }

    /// Most guards ever alive at once
    #[cfg(test)]
    pub(crate) fn peak_guards(&self) -> u8 {
        self.peak.load(Ordering::SeqCst)
    }

    /// Take the token, polling until `timeout`.
    ///
    /// Returns [`IoError::Contention`] when the wait expires.
    pub fn acquire<D: DelayNs>(
        &self,
        role: Role,
        timeout: Timeout,
        delay: &mut D,
    ) -> IoResult<SlotGuard<'_, CAP>> {
        let mut remaining = match timeout {
            Timeout::Forever => None,
            Timeout::Millis(ms) => Some(ms.saturating_mul(1000) / POLL_INTERVAL_US),
        };
        loop {
            if let Some(guard) = self.try_acquire(role) {
                return Ok(guard);
            }
            match remaining.as_mut() {
                Some(0) => return Err(IoError::Contention),
                Some(n) => *n -= 1,
                None => {}
            }
            delay.delay_us(POLL_INTERVAL_US);
        }
    }
}

/// Exclusive access to one slot. Dropping it returns the token.
pub struct SlotGuard<'s, const CAP: usize = MAX_FRAME_LEN> {
    slot: &'s BufferSlot<CAP>,
    role: Role,
}

impl<'s, const CAP: usize> SlotGuard<'s, CAP> {
    /// Slot index
    pub fn id(&self) -> SlotId {
        self.slot.id
    }

    /// Role holding the token
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current state
    pub fn state(&self) -> SlotState {
        self.slot.state()
    }

    /// `Free -> Filling`: stamp `seq` on an empty frame. Generator only.
    pub fn begin_fill(&mut self, seq: u32) -> IoResult<()> {
        self.transition(Role::Generator, SlotState::Free, SlotState::Filling)?;
        self.frame_mut()?.restart(seq);
        Ok(())
    }

    /// `Filling -> Filling`: drop the samples written so far and stamp `seq`.
    pub fn restart_fill(&mut self, seq: u32) -> IoResult<()> {
        self.frame_mut()?.restart(seq);
        Ok(())
    }

    /// Frame being filled. Generator only, in `Filling`.
    pub fn frame_mut(&mut self) -> IoResult<&mut Frame<CAP>> {
        if self.role != Role::Generator || self.state() != SlotState::Filling {
            return Err(IoError::InvalidTransition);
        }
        // SAFETY: this guard is the only token holder and the state rules
        // out concurrent readers.
        Ok(unsafe { &mut *self.slot.frame.get() })
    }

    /// `Filling -> ReadyToSend`. Generator only.
    pub fn mark_ready(&mut self) -> IoResult<()> {
        self.transition(Role::Generator, SlotState::Filling, SlotState::ReadyToSend)
    }

    /// `ReadyToSend -> Sending`. Sender only; returns the frame to submit.
    ///
    /// Starts a new send generation.
    pub fn begin_send(&mut self) -> IoResult<&Frame<CAP>> {
        self.transition(Role::Sender, SlotState::ReadyToSend, SlotState::Sending)?;
        Ok(self.frame())
    }

    /// `Sending -> Free`. Sender only.
    pub fn finish_send(&mut self) -> IoResult<()> {
        self.transition(Role::Sender, SlotState::Sending, SlotState::Free)
    }

    /// Frame contents
    pub fn frame(&self) -> &Frame<CAP> {
        // SAFETY: writes need `&mut self` on this same guard.
        unsafe { &*self.slot.frame.get() }
    }

    fn transition(&mut self, role: Role, from: SlotState, to: SlotState) -> IoResult<()> {
        if self.role != role {
            return Err(IoError::InvalidTransition);
        }
        let moved = self.slot.meta.with(|m| {
            if m.state != from {
                return false;
            }
            m.state = to;
            if to == SlotState::Sending {
                m.generation = m.generation.wrapping_add(1);
            }
            true
        });
        if !moved {
            return Err(IoError::InvalidTransition);
        }
        log_trace!("slot {}: {:?} -> {:?}", self.slot.id.0, from, to);
        Ok(())
    }
}

impl<const CAP: usize> Drop for SlotGuard<'_, CAP> {
    fn drop(&mut self) {
        #[cfg(test)]
        self.slot.live.fetch_sub(1, Ordering::SeqCst);
        self.slot.meta.with(|m| m.holder = None);
    }
}
