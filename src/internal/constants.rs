//! Centralized Constants
//!
//! Single source of truth for the frame layout, transfer engine limits and
//! timing defaults used throughout the pipeline.
//!
//! # Organization
//!
//! - **Frame layout**: link-layer payload limits and the sample format
//! - **Transfer engine**: descriptor field limits
//! - **Timing**: bounded waits, poll intervals and report periods
//! - **Receive path**: queue depth and the serial sync token
//!
//! # Note
//!
//! Descriptor bit positions live in `descriptor_bits.rs`, next to the
//! other hardware word layouts.

// =============================================================================
// Frame Layout
// =============================================================================

/// Maximum link-layer payload in bytes (sequence number included)
pub const MAX_FRAME_LEN: usize = 114;

/// Size of the big-endian sequence number that opens every frame
pub const SEQ_LEN: usize = 4;

/// Number of 16-bit axes in one sample unit (x, y, z)
pub const SAMPLE_AXES: usize = 3;

/// Bytes written per sample unit
pub const SAMPLE_UNIT_LEN: usize = SAMPLE_AXES * 2;

/// Default sample units per frame (48 values = 96 payload bytes)
pub const DEFAULT_SAMPLES_PER_FRAME: usize = 16;

/// Default total frame length (sequence number + payload)
pub const DEFAULT_FRAME_LEN: usize = SEQ_LEN + DEFAULT_SAMPLES_PER_FRAME * SAMPLE_UNIT_LEN;

/// Constant marker written to the z axis by the counter source
pub const Z_MARKER: u16 = 127;

/// Number of buffer slots in the default double-buffered pipeline
pub const DEFAULT_SLOTS: usize = 2;

/// Upper bound on slots (one ready flag and one sent flag per slot)
pub const MAX_SLOTS: usize = 8;

// =============================================================================
// Transfer Engine
// =============================================================================

/// Maximum transfer units a single descriptor can move (11-bit count-minus-one field)
pub const MAX_UNITS_PER_DESCRIPTOR: usize = 2048;

/// Default descriptor capacity of a stream channel
pub const DEFAULT_CHAIN_CAPACITY: usize = 4;

/// Interrupt priority the transfer engine is configured with
pub const TRANSFER_IRQ_PRIORITY: u8 = 3;

/// Default transfer engine channel used for the serial stream
pub const DEFAULT_STREAM_CHANNEL: u8 = 1;

// =============================================================================
// Timing
// =============================================================================

/// Default generator tick in milliseconds (one sample unit per tick)
pub const DEFAULT_SAMPLE_PERIOD_MS: u32 = 1;

/// Default bounded wait for a slot's ownership token
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u32 = 1000;

/// Default bounded wait for a transfer completion
pub const DEFAULT_COMPLETION_TIMEOUT_MS: u32 = 1000;

/// Default statistics report interval
pub const DEFAULT_REPORT_INTERVAL_MS: u32 = 1000;

/// Default heartbeat interval
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u32 = 10_000;

/// Default bounded wait for an inbound frame on the receive path
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u32 = 3000;

/// Poll interval used by bounded waits, in microseconds
pub const POLL_INTERVAL_US: u32 = 100;

// =============================================================================
// Receive Path
// =============================================================================

/// Depth of the inbound frame queue (one slot is kept free by the SPSC queue)
pub const RX_QUEUE_DEPTH: usize = 6;

/// Sync token streamed ahead of the payload data
pub const SYNC_TOKEN: [u16; 2] = [0xDEAD, 0xBEEF];

/// Sync token as it appears on the wire
pub const SYNC_TOKEN_WIRE: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];
