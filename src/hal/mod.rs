//! Hardware Abstraction Layer
//!
//! Capability traits for the collaborators the pipeline drives but does not
//! implement: the bulk transfer engine, the radio link and the status
//! channel. Register-level code lives behind these traits.
//!
//! # Modules
//!
//! - [`transfer`]: Transfer engine and its interrupt-side handle
//! - [`radio`]: Radio link send/receive
//! - [`status`]: Status indicators, with atomic and LED implementations
//!
//! # Delay Integration
//!
//! Every bounded wait takes an `embedded_hal::delay::DelayNs`. Pass the delay
//! implementation from your HAL or RTOS.

pub mod radio;
pub mod status;
pub mod transfer;

pub use radio::{RadioLink, ReceiveHandler, SendOutcome, SendToken};
pub use status::{Indicator, LedIndicators, StatusFlags, StatusIndicator};
pub use transfer::{TransferEngine, TransferInterrupt};
