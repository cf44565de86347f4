//! Radio link HAL
//!
//! The link layer transmits whole frames asynchronously. A send is accepted
//! or rejected synchronously; the final outcome arrives later, exactly once,
//! from the link layer's own context through
//! [`Pipeline::on_send_complete`](crate::pipeline::Pipeline::on_send_complete)
//! carrying the [`SendToken`] that was passed to [`RadioLink::send`].
//!
//! Tokens carry a per-slot generation. A completion whose generation is no
//! longer the slot's current send is dropped.

use crate::driver::error::IoResult;
use crate::pipeline::slot::SlotId;

/// Identifies an outstanding send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SendToken {
    /// Slot whose frame is being sent
    pub slot: SlotId,
    /// Which send from that slot
    pub generation: u32,
}

/// Final outcome of a send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendOutcome {
    /// Frame left the radio
    Sent,
    /// Link layer gave up on the frame
    Failed,
}

/// Receives inbound frames from the link layer.
///
/// Called once per frame from the link layer's context; must not block.
pub trait ReceiveHandler: Sync {
    /// Handle one inbound payload
    fn on_frame(&self, payload: &[u8]);
}

/// Trait for the radio/link layer
pub trait RadioLink {
    /// Queue `frame` for transmission. `Ok` means the completion will follow.
    fn send(&mut self, frame: &[u8], token: SendToken) -> IoResult<()>;

    /// Register the handler invoked for every inbound frame.
    fn register_receive(&mut self, handler: &'static dyn ReceiveHandler);
}
