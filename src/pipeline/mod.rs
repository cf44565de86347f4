//! Double-buffered telemetry pipeline.
//!
//! A [`Generator`] fills frames in alternating [`BufferSlot`]s and signals
//! each complete one; a [`Sender`] pushes ready frames through a
//! [`Transport`] (radio link or serial stream) and frees the slot once the
//! completion for that submission arrives. On the receiving node a
//! [`Forwarder`] takes frames from the radio's [`FrameInbox`] and streams
//! them out through the transfer engine.
//!
//! ```text
//!   Generator ──ready(n)──▶ Sender ──submit──▶ Transport
//!       ▲                     ▲                   │
//!       └──── slot n Free ────┴──sent(n)/CHAIN_DONE┘ (completion context)
//! ```
//!
//! # Example
//!
//! ```ignore
//! static PIPELINE: Pipeline = Pipeline::new();
//! static STATUS: StatusFlags = StatusFlags::new();
//!
//! // generator task
//! let mut generator = Generator::new(&PIPELINE, CounterSource::new(), &STATUS, config)?;
//! generator.run(&mut delay);
//!
//! // sender task
//! let mut sender = Sender::new(&PIPELINE, RadioTransport::new(radio), &STATUS, config);
//! sender.run(&mut delay);
//!
//! // link layer completion callback
//! PIPELINE.on_send_complete(token, outcome);
//! ```

pub mod frame;
pub mod generator;
pub mod receiver;
pub mod reporter;
pub mod sender;
pub mod slot;
pub mod state;
pub mod tracker;

pub use frame::{AxisSample, CounterSource, Frame, SampleSource};
pub use generator::{Generator, TickOutcome};
pub use receiver::{FrameInbox, Forwarder, ForwardOutcome};
pub use reporter::{Heartbeat, Reporter};
pub use sender::{RadioTransport, SendReport, Sender, StreamTransport, Transport};
pub use slot::{BufferSlot, Role, SlotGuard, SlotId, SlotState};
pub use state::{PipelineState, PipelineStats};
pub use tracker::{ContentCheck, LossTracker, SequenceCheck, is_gap};

use crate::hal::radio::{SendOutcome, SendToken};
use crate::internal::constants::{DEFAULT_SLOTS, MAX_FRAME_LEN, MAX_SLOTS};
use crate::internal::fmt::{log_debug, log_trace};
use crate::sync::{EventFlags, event};

/// Slots, event flags and shared state of one pipeline
pub struct Pipeline<const SLOTS: usize = DEFAULT_SLOTS, const CAP: usize = MAX_FRAME_LEN> {
    slots: [BufferSlot<CAP>; SLOTS],
    events: EventFlags,
    state: PipelineState,
}

impl<const SLOTS: usize, const CAP: usize> Default for Pipeline<SLOTS, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SLOTS: usize, const CAP: usize> Pipeline<SLOTS, CAP> {
    /// All slots free (const, suitable for static initialization)
    pub const fn new() -> Self {
        const { assert!(SLOTS >= 2 && SLOTS <= MAX_SLOTS, "2..=MAX_SLOTS slots") };

        let mut slots = [const { BufferSlot::<CAP>::new(SlotId(0)) }; SLOTS];
        let mut i = 1;
        while i < SLOTS {
            slots[i] = BufferSlot::new(SlotId(i as u8));
            i += 1;
        }
        Self {
            slots,
            events: EventFlags::new(),
            state: PipelineState::new(),
        }
    }

    /// Number of slots
    pub const fn slot_count(&self) -> usize {
        SLOTS
    }

    /// Slot `id`, if it exists
    pub fn slot(&self, id: SlotId) -> Option<&BufferSlot<CAP>> {
        self.slots.get(id.index())
    }

    /// All slots
    pub fn slots(&self) -> &[BufferSlot<CAP>] {
        &self.slots
    }

    /// Slot after `id` in fill order
    pub fn next_slot(&self, id: SlotId) -> SlotId {
        SlotId(((id.index() + 1) % SLOTS) as u8)
    }

    /// Event flags shared by the roles and the completion context
    pub fn events(&self) -> &EventFlags {
        &self.events
    }

    /// Shared sequence and statistics state
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Link layer completion callback.
    ///
    /// Call exactly once per accepted [`RadioLink::send`](crate::hal::RadioLink::send),
    /// from any context. Only posts event bits, and only while the token's
    /// send is still in flight; a completion for a send the sender already
    /// gave up on is dropped.
    pub fn on_send_complete(&self, token: SendToken, outcome: SendOutcome) {
        let id = token.slot.0;
        let bits = match outcome {
            SendOutcome::Sent => event::sent(id),
            SendOutcome::Failed => event::sent(id) | event::send_failed(id),
        };
        let posted = self
            .slot(token.slot)
            .is_some_and(|slot| slot.while_sending(token.generation, || self.events.set(bits)));
        if posted {
            log_trace!("send complete on slot {}: {:?}", id, outcome);
        } else {
            log_debug!("stale completion on slot {} (generation {}) dropped", id, token.generation);
        }
    }
}
