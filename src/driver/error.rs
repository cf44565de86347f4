//! Error types for the telemetry pipeline
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Pipeline and stream configuration failures
//! - [`ChainError`]: Descriptor chain build rejections
//! - [`TransferError`]: Bulk transfer engine submission and fault states
//! - [`IoError`]: Runtime slot, queue and link failures
//!
//! The unified [`Error`] enum wraps all domain errors.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors
///
/// Returned when a [`PipelineConfig`](crate::PipelineConfig) or
/// [`StreamConfig`](crate::StreamConfig) fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Invalid configuration parameter
    InvalidConfig,
    /// Configured frame does not fit the link-layer payload or slot capacity
    FrameTooLarge,
    /// Payload length is not a whole number of transfer units
    InvalidUnitSize,
    /// Channel already configured
    AlreadyConfigured,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::FrameTooLarge => "frame exceeds maximum length",
            ConfigError::InvalidUnitSize => "payload not a multiple of unit size",
            ConfigError::AlreadyConfigured => "already configured",
        }
    }
}

// =============================================================================
// Chain Errors
// =============================================================================

/// Descriptor chain build errors
///
/// Requests are rejected at the builder boundary; payloads are never
/// silently truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChainError {
    /// Length is zero or not a multiple of the unit size
    InvalidLength,
    /// Chain would need more descriptors than the storage holds
    CapacityExceeded,
    /// Max units per descriptor is zero or beyond the count field
    InvalidUnitCount,
}

impl core::fmt::Display for ChainError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ChainError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChainError::InvalidLength => "invalid transfer length",
            ChainError::CapacityExceeded => "descriptor capacity exceeded",
            ChainError::InvalidUnitCount => "invalid units per descriptor",
        }
    }
}

// =============================================================================
// Transfer Errors
// =============================================================================

/// Bulk transfer engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// Engine still executing a previous chain
    Busy,
    /// Channel latched a hardware error and refuses submissions until reset
    ChannelFaulted,
    /// Engine not configured yet
    NotConfigured,
    /// Hardware reported a transfer error
    HardwareError,
}

impl core::fmt::Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransferError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransferError::Busy => "transfer engine busy",
            TransferError::ChannelFaulted => "channel faulted",
            TransferError::NotConfigured => "transfer engine not configured",
            TransferError::HardwareError => "hardware transfer error",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Runtime pipeline errors
///
/// All of these are recoverable: the caller records them and continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Slot token not acquired within the bounded wait
    Contention,
    /// Signal not received within the bounded wait
    Timeout,
    /// Slot is not in the state the operation requires
    InvalidTransition,
    /// Inbound queue full, frame dropped
    QueueFull,
    /// Radio link rejected the frame
    LinkError,
    /// Frame longer than the link-layer maximum
    FrameTooLarge,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Contention => "slot contention",
            IoError::Timeout => "operation timed out",
            IoError::InvalidTransition => "invalid slot state transition",
            IoError::QueueFull => "queue full",
            IoError::LinkError => "radio link error",
            IoError::FrameTooLarge => "frame too large",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// ```ignore
/// match result {
///     Err(Error::Chain(ChainError::CapacityExceeded)) => { /* ... */ }
///     Err(Error::Transfer(TransferError::Busy)) => { /* ... */ }
///     Err(Error::Io(IoError::Contention)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Descriptor chain error
    Chain(ChainError),
    /// Transfer engine error
    Transfer(TransferError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Chain(e) => write!(f, "chain: {}", e.as_str()),
            Error::Transfer(e) => write!(f, "transfer: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<ChainError> for Error {
    fn from(e: ChainError) -> Self {
        Error::Chain(e)
    }
}

impl From<TransferError> for Error {
    fn from(e: TransferError) -> Self {
        Error::Transfer(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for chain building
pub type ChainResult<T> = core::result::Result<T, ChainError>;

/// Result type alias for transfer engine operations
pub type TransferResult<T> = core::result::Result<T, TransferError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;

    #[test]
    fn config_error_as_str_non_empty() {
        let variants = [
            ConfigError::InvalidConfig,
            ConfigError::FrameTooLarge,
            ConfigError::InvalidUnitSize,
            ConfigError::AlreadyConfigured,
        ];

        for variant in variants {
            assert!(!variant.as_str().is_empty(), "ConfigError::{variant:?} has empty string");
        }
    }

    #[test]
    fn chain_error_display() {
        let err = ChainError::CapacityExceeded;
        assert_eq!(format!("{err}"), "descriptor capacity exceeded");
    }

    #[test]
    fn transfer_error_as_str_non_empty() {
        let variants = [
            TransferError::Busy,
            TransferError::ChannelFaulted,
            TransferError::NotConfigured,
            TransferError::HardwareError,
        ];

        for variant in variants {
            assert!(!variant.as_str().is_empty(), "TransferError::{variant:?} has empty string");
        }
    }

    #[test]
    fn io_error_display() {
        assert_eq!(format!("{}", IoError::Contention), "slot contention");
        assert_eq!(format!("{}", IoError::Timeout), "operation timed out");
    }

    #[test]
    fn error_from_chain_error() {
        let err: Error = ChainError::InvalidLength.into();
        assert_eq!(err, Error::Chain(ChainError::InvalidLength));
    }

    #[test]
    fn error_from_transfer_error() {
        let err: Error = TransferError::ChannelFaulted.into();

        match err {
            Error::Transfer(e) => assert_eq!(e, TransferError::ChannelFaulted),
            _ => panic!("Expected Error::Transfer"),
        }
    }

    #[test]
    fn error_display_includes_domain() {
        let display = format!("{}", Error::Transfer(TransferError::HardwareError));
        assert!(display.contains("transfer"));
        assert!(display.contains("hardware"));

        let display = format!("{}", Error::Io(IoError::QueueFull));
        assert!(display.starts_with("io:"));
    }

    #[test]
    fn question_mark_converts_domain_errors() {
        fn build() -> Result<()> {
            Err(ChainError::CapacityExceeded)?;
            Ok(())
        }

        assert_eq!(build(), Err(Error::Chain(ChainError::CapacityExceeded)));
    }
}
