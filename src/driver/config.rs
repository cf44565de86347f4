//! Configuration types for the telemetry pipeline and the stream channel

use crate::descriptor::{ChainParams, UnitSize};
use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_ACQUIRE_TIMEOUT_MS, DEFAULT_COMPLETION_TIMEOUT_MS, DEFAULT_HEARTBEAT_INTERVAL_MS,
    DEFAULT_RECEIVE_TIMEOUT_MS, DEFAULT_REPORT_INTERVAL_MS, DEFAULT_SAMPLE_PERIOD_MS,
    DEFAULT_SAMPLES_PER_FRAME, DEFAULT_STREAM_CHANNEL, MAX_FRAME_LEN, MAX_UNITS_PER_DESCRIPTOR,
    SAMPLE_UNIT_LEN, SEQ_LEN, SYNC_TOKEN, TRANSFER_IRQ_PRIORITY,
};

/// Bounded or unbounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timeout {
    /// Wait until the condition holds
    Forever,
    /// Give up after this many milliseconds
    Millis(u32),
}

impl Timeout {
    /// Whether the wait is bounded
    #[must_use]
    pub const fn is_bounded(self) -> bool {
        matches!(self, Timeout::Millis(_))
    }
}

/// What the generator does when the next slot is still owned by the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverrunPolicy {
    /// Keep the current slot and refill it from the start, losing its unsent data
    #[default]
    OverwriteOldest,
    /// Discard the new sample and keep the full slot untouched
    DropSample,
}

/// Width of the sequence counter; the counter wraps at `2^bits`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceWidth {
    /// 16-bit counter
    Bits16,
    /// 32-bit counter (matches the 4-byte wire field)
    #[default]
    Bits32,
}

impl SequenceWidth {
    /// Largest representable sequence number
    #[must_use]
    pub const fn max(self) -> u32 {
        match self {
            SequenceWidth::Bits16 => u16::MAX as u32,
            SequenceWidth::Bits32 => u32::MAX,
        }
    }

    /// Successor of `seq` with wraparound
    #[must_use]
    pub const fn next(self, seq: u32) -> u32 {
        seq.wrapping_add(1) & self.max()
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineConfig {
    /// Three-axis sample units per frame
    pub samples_per_frame: usize,
    /// Generator tick in milliseconds
    pub sample_period_ms: u32,
    /// Bounded wait for a slot's ownership token
    pub acquire_timeout: Timeout,
    /// Sender wait for a "slot ready" signal
    pub ready_timeout: Timeout,
    /// Sender wait for a transfer completion
    pub completion_timeout: Timeout,
    /// Forwarder wait for an inbound frame
    pub receive_timeout: Timeout,
    /// Generator behavior when the next slot is busy
    pub overrun_policy: OverrunPolicy,
    /// Sequence counter width
    pub sequence_width: SequenceWidth,
    /// Statistics report period in milliseconds
    pub report_interval_ms: u32,
    /// Heartbeat period in milliseconds
    pub heartbeat_interval_ms: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            samples_per_frame: DEFAULT_SAMPLES_PER_FRAME,
            sample_period_ms: DEFAULT_SAMPLE_PERIOD_MS,
            acquire_timeout: Timeout::Millis(DEFAULT_ACQUIRE_TIMEOUT_MS),
            ready_timeout: Timeout::Forever,
            completion_timeout: Timeout::Millis(DEFAULT_COMPLETION_TIMEOUT_MS),
            receive_timeout: Timeout::Millis(DEFAULT_RECEIVE_TIMEOUT_MS),
            overrun_policy: OverrunPolicy::OverwriteOldest,
            sequence_width: SequenceWidth::Bits32,
            report_interval_ms: DEFAULT_REPORT_INTERVAL_MS,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the number of sample units per frame
    #[must_use]
    pub const fn with_samples_per_frame(mut self, samples: usize) -> Self {
        self.samples_per_frame = samples;
        self
    }

    /// Set the generator tick
    #[must_use]
    pub const fn with_sample_period_ms(mut self, period_ms: u32) -> Self {
        self.sample_period_ms = period_ms;
        self
    }

    /// Set the slot acquire timeout
    #[must_use]
    pub const fn with_acquire_timeout(mut self, timeout: Timeout) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the sender's ready wait
    #[must_use]
    pub const fn with_ready_timeout(mut self, timeout: Timeout) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Set the completion wait
    #[must_use]
    pub const fn with_completion_timeout(mut self, timeout: Timeout) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// Set the forwarder's receive wait
    #[must_use]
    pub const fn with_receive_timeout(mut self, timeout: Timeout) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Set the overrun policy
    #[must_use]
    pub const fn with_overrun_policy(mut self, policy: OverrunPolicy) -> Self {
        self.overrun_policy = policy;
        self
    }

    /// Set the sequence counter width
    #[must_use]
    pub const fn with_sequence_width(mut self, width: SequenceWidth) -> Self {
        self.sequence_width = width;
        self
    }

    /// Set the statistics report period
    #[must_use]
    pub const fn with_report_interval_ms(mut self, interval_ms: u32) -> Self {
        self.report_interval_ms = interval_ms;
        self
    }

    /// Set the heartbeat period
    #[must_use]
    pub const fn with_heartbeat_interval_ms(mut self, interval_ms: u32) -> Self {
        self.heartbeat_interval_ms = interval_ms;
        self
    }

    // =========================================================================
    // Derived Values
    // =========================================================================

    /// Payload bytes per frame (sequence number excluded)
    #[must_use]
    pub const fn payload_len(&self) -> usize {
        self.samples_per_frame * SAMPLE_UNIT_LEN
    }

    /// Total frame bytes (sequence number included)
    #[must_use]
    pub const fn frame_len(&self) -> usize {
        SEQ_LEN + self.payload_len()
    }

    /// Check the configuration against the link-layer limits
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.samples_per_frame == 0 || self.sample_period_ms == 0 {
            return Err(ConfigError::InvalidConfig);
        }
        if self.report_interval_ms == 0 || self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::InvalidConfig);
        }
        if self.frame_len() > MAX_FRAME_LEN {
            return Err(ConfigError::FrameTooLarge);
        }
        Ok(())
    }
}

/// Peripheral request signal that paces the transfer engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestSignal(pub u32);

/// Stream channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamConfig {
    /// Engine channel number (0..=7)
    pub channel: u8,
    /// Interrupt priority for the completion interrupt
    pub irq_priority: u8,
    /// Device data register the stream is written to
    pub destination: usize,
    /// Request signal of the serial peripheral
    pub request: RequestSignal,
    /// Unit size class
    pub unit_size: UnitSize,
    /// Maximum units per descriptor
    pub max_units: usize,
    /// Swap bytes of payload units (payloads are already in wire order)
    pub payload_byte_swap: bool,
    /// Swap bytes of sync token units (token words are native order)
    pub token_byte_swap: bool,
    /// Sync token streamed ahead of the data
    pub sync_token: [u16; 2],
    /// Stream the sync token once when the forwarder starts
    pub emit_token_at_start: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

impl StreamConfig {
    /// Create a configuration for the given destination register
    #[must_use]
    pub const fn new(destination: usize) -> Self {
        Self {
            channel: DEFAULT_STREAM_CHANNEL,
            irq_priority: TRANSFER_IRQ_PRIORITY,
            destination,
            request: RequestSignal(0),
            unit_size: UnitSize::HalfWord,
            max_units: MAX_UNITS_PER_DESCRIPTOR,
            payload_byte_swap: false,
            token_byte_swap: true,
            sync_token: SYNC_TOKEN,
            emit_token_at_start: true,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the engine channel
    #[must_use]
    pub const fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Set the completion interrupt priority
    #[must_use]
    pub const fn with_irq_priority(mut self, priority: u8) -> Self {
        self.irq_priority = priority;
        self
    }

    /// Set the peripheral request signal
    #[must_use]
    pub const fn with_request(mut self, request: RequestSignal) -> Self {
        self.request = request;
        self
    }

    /// Set the unit size
    #[must_use]
    pub const fn with_unit_size(mut self, unit_size: UnitSize) -> Self {
        self.unit_size = unit_size;
        self
    }

    /// Set the per-descriptor unit limit
    #[must_use]
    pub const fn with_max_units(mut self, max_units: usize) -> Self {
        self.max_units = max_units;
        self
    }

    /// Enable or disable byte swapping of payload units
    #[must_use]
    pub const fn with_payload_byte_swap(mut self, enabled: bool) -> Self {
        self.payload_byte_swap = enabled;
        self
    }

    /// Enable or disable byte swapping of sync token units
    #[must_use]
    pub const fn with_token_byte_swap(mut self, enabled: bool) -> Self {
        self.token_byte_swap = enabled;
        self
    }

    /// Set the sync token
    #[must_use]
    pub const fn with_sync_token(mut self, token: [u16; 2]) -> Self {
        self.sync_token = token;
        self
    }

    /// Stream the sync token at start or not
    #[must_use]
    pub const fn with_token_at_start(mut self, enabled: bool) -> Self {
        self.emit_token_at_start = enabled;
        self
    }

    // =========================================================================
    // Derived Values
    // =========================================================================

    /// Chain parameters for frame payloads
    #[must_use]
    pub const fn payload_params(&self) -> ChainParams {
        ChainParams::new(self.destination)
            .with_unit_size(self.unit_size)
            .with_max_units(self.max_units)
            .with_byte_swap(self.payload_byte_swap)
    }

    /// Chain parameters for the sync token
    #[must_use]
    pub const fn token_params(&self) -> ChainParams {
        ChainParams::new(self.destination)
            .with_unit_size(UnitSize::HalfWord)
            .with_max_units(self.max_units)
            .with_byte_swap(self.token_byte_swap)
    }

    /// Check channel number and descriptor limits
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.channel > 7 {
            return Err(ConfigError::InvalidConfig);
        }
        if self.max_units == 0 || self.max_units > MAX_UNITS_PER_DESCRIPTOR {
            return Err(ConfigError::InvalidConfig);
        }
        // Swapping needs at least two bytes per unit
        if self.payload_byte_swap && matches!(self.unit_size, UnitSize::Byte) {
            return Err(ConfigError::InvalidUnitSize);
        }
        Ok(())
    }
}

/// Stream channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Not configured
    #[default]
    Unconfigured,
    /// Configured, no chain in flight
    Idle,
    /// A chain was started and has not completed yet
    Running,
    /// Hardware error latched; submissions refused until reset
    Faulted,
}

// =============================================================================
// Unit Tests
// =============================================================================
