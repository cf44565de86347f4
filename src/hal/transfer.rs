//! Bulk Transfer Engine HAL
//!
//! Capability traits for the hardware streaming channel. Register access is
//! left to the implementor; the pipeline only needs to configure the channel,
//! start a descriptor chain, stop it and ask whether it is still running.

use crate::descriptor::TransferDescriptor;
use crate::driver::config::{RequestSignal, StreamConfig};
use crate::driver::error::TransferResult;
use crate::driver::interrupt::TransferStatus;

/// Trait for the bulk transfer engine.
///
/// # Memory contract
///
/// `start` may retain the address of `chain` and of the source buffers its
/// descriptors point at. The caller keeps both alive and unmodified until the
/// completion signal fires or `stop` returns. [`StreamChannel`] upholds this
/// by owning the descriptor storage and refusing to rebuild while `busy()`.
///
/// [`StreamChannel`]: crate::driver::channel::StreamChannel
pub trait TransferEngine {
    /// One-time init: enable the engine clock and interrupt, set the interrupt priority.
    fn configure(&mut self, config: &StreamConfig) -> TransferResult<()>;

    /// Begin executing `chain`, paced by `request`.
    ///
    /// Must not be called while [`busy`](Self::busy) is true.
    fn start(&mut self, chain: &[TransferDescriptor], request: RequestSignal)
    -> TransferResult<()>;

    /// Abort the current chain, if any.
    fn stop(&mut self);

    /// Whether a chain is still executing.
    fn busy(&self) -> bool;
}

/// Interrupt-side view of the transfer engine.
///
/// Implemented by whatever handle the completion interrupt owns. Both methods
/// must be callable from interrupt context without blocking.
pub trait TransferInterrupt {
    /// Read pending interrupt flags.
    fn pending(&self) -> TransferStatus;

    /// Clear the given flags (write-1-to-clear).
    fn clear(&mut self, status: TransferStatus);
}
