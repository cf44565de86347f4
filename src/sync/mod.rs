//! Synchronization and Concurrency Support
//!
//! Everything that crosses between the pipeline tasks and the transfer
//! engine's interrupt:
//!
//! - **Primitives** (`primitives`): Low-level synchronization types
//!   - [`CriticalSectionCell`] - ISR-safe interior mutability
//!   - [`AtomicWaker`] - Async waker storage for interrupts (`async` feature)
//!
//! - **Signals** (`signal`): [`EventFlags`] and the [`event`] bit layout
//!
//! - **Completion** (`completion`): [`CompletionBridge`] and [`FaultLatch`]
//!
//! # Example
//!
//! ```ignore
//! use telemetry_ldma::sync::{CompletionBridge, EventFlags, FaultLatch};
//! use telemetry_ldma::hal::StatusFlags;
//!
//! static EVENTS: EventFlags = EventFlags::new();
//! static LATCH: FaultLatch = FaultLatch::new();
//! static STATUS: StatusFlags = StatusFlags::new();
//!
//! #[interrupt]
//! fn LDMA() {
//!     let bridge = CompletionBridge::new(1, &EVENTS, &LATCH, &STATUS);
//!     bridge.on_interrupt(&mut LdmaIrq);
//! }
//! ```

mod completion;
mod primitives;
mod signal;

pub use completion::{Completion, CompletionBridge, FaultLatch};
#[cfg(feature = "async")]
pub use primitives::AtomicWaker;
pub use primitives::CriticalSectionCell;
pub use signal::{EventFlags, event};
