//! Telemetry LDMA Pipeline
//!
//! A `no_std`, `no_alloc` double-buffered telemetry pipeline. A generator
//! fills fixed-size frames of 3-axis samples into rotating buffer slots, a
//! sender ships each completed frame either over a radio link or through a
//! linked chain of transfer descriptors to a serial data register, and a
//! receiver forwards radio frames to the serial stream behind a sync token.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! 1. **Pipeline** ([`pipeline`]): Slots, generator, sender, receiver, loss tracking
//! 2. **Driver** ([`driver`]): Stream channel, configuration, errors, interrupt status
//! 3. **Descriptors** ([`descriptor`]): Transfer descriptors and chain building
//! 4. **Sync** ([`sync`]): Event flags, completion bridge, fault latch
//! 5. **HAL** ([`hal`]): Transfer engine, radio link and status indicator traits
//!
//! The host-side [`decode`] module turns the serial byte stream back into
//! values.
//!
//! # Features
//!
//! - `defmt`: Enable defmt logging and formatting for public types
//! - `log`: Enable logging through the `log` facade
//! - `async`: Enable async waits on event flags
//!
//! # Example
//!
//! ```ignore
//! use telemetry_ldma::{CounterSource, Generator, Pipeline, PipelineConfig, Sender};
//! use telemetry_ldma::hal::StatusFlags;
//! use telemetry_ldma::pipeline::RadioTransport;
//!
//! static PIPELINE: Pipeline = Pipeline::new();
//! static STATUS: StatusFlags = StatusFlags::new();
//!
//! let config = PipelineConfig::new();
//! let mut generator = Generator::new(&PIPELINE, CounterSource::new(), &STATUS, config)?;
//! let mut sender = Sender::new(&PIPELINE, RadioTransport::new(radio), &STATUS, config);
//!
//! // Generator task
//! generator.run(&mut delay);
//! // Sender task
//! sender.run(&mut delay);
//! ```
//!
//! # Memory Requirements
//!
//! With the defaults (2 slots of 114 bytes, 4-descriptor chain):
//! - Under 1 KB of static RAM for the pipeline and one stream channel

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here and in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// =============================================================================
// Modules
// =============================================================================

pub mod decode;
pub mod descriptor;
pub mod driver;
pub mod hal;
pub mod pipeline;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use decode::{DecodeEvent, StreamDecoder};
pub use descriptor::{DescriptorChain, TransferDescriptor, UnitSize};
pub use driver::channel::StreamChannel;
pub use driver::config::{
    ChannelState, OverrunPolicy, PipelineConfig, RequestSignal, SequenceWidth, StreamConfig,
    Timeout,
};
pub use driver::error::{
    ChainError, ChainResult, ConfigError, ConfigResult, Error, IoError, IoResult, Result,
    TransferError, TransferResult,
};
pub use driver::interrupt::TransferStatus;
pub use pipeline::{
    CounterSource, Forwarder, FrameInbox, Generator, Pipeline, PipelineState, PipelineStats,
    Reporter, SampleSource, Sender,
};

/// Shared pipeline constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on pipeline types.
pub mod constants {
    pub use crate::internal::constants::{
        // Frame layout
        DEFAULT_FRAME_LEN,
        DEFAULT_SAMPLES_PER_FRAME,
        MAX_FRAME_LEN,
        SAMPLE_AXES,
        SAMPLE_UNIT_LEN,
        SEQ_LEN,
        Z_MARKER,
        // Slots
        DEFAULT_SLOTS,
        MAX_SLOTS,
        // Timing
        DEFAULT_ACQUIRE_TIMEOUT_MS,
        DEFAULT_COMPLETION_TIMEOUT_MS,
        DEFAULT_HEARTBEAT_INTERVAL_MS,
        DEFAULT_RECEIVE_TIMEOUT_MS,
        DEFAULT_REPORT_INTERVAL_MS,
        DEFAULT_SAMPLE_PERIOD_MS,
        POLL_INTERVAL_US,
        // Receive path
        RX_QUEUE_DEPTH,
        // Sync token
        SYNC_TOKEN,
        SYNC_TOKEN_WIRE,
        // Engine limits
        DEFAULT_CHAIN_CAPACITY,
        DEFAULT_STREAM_CHANNEL,
        MAX_UNITS_PER_DESCRIPTOR,
        TRANSFER_IRQ_PRIORITY,
    };
}
