//! Stream driver: configuration, errors, interrupt status and the stream channel.

pub mod channel;
pub mod config;
pub mod error;
pub mod interrupt;

pub use channel::StreamChannel;
pub use config::{
    ChannelState, OverrunPolicy, PipelineConfig, RequestSignal, SequenceWidth, StreamConfig,
    Timeout,
};
pub use error::{
    ChainError, ChainResult, ConfigError, ConfigResult, Error, IoError, IoResult, Result,
    TransferError, TransferResult,
};
pub use interrupt::TransferStatus;
