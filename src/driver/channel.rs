//! Stream channel.
//!
//! Owns one transfer engine channel together with the descriptor storage it
//! executes from, and enforces the submission rules:
//!
//! 1. nothing is started before [`configure`](StreamChannel::configure);
//! 2. nothing is started while the [`FaultLatch`] is tripped;
//! 3. nothing is started while the engine is busy; the caller gets
//!    [`TransferError::Busy`] and decides what to drop (no queueing).
//!
//! # Memory Placement
//!
//! The engine reads descriptors and the sync token straight from this
//! struct. Do not move the channel while a chain is running; place it in a
//! `static` or keep it in a task that never returns.

use embedded_hal::delay::DelayNs;

use crate::descriptor::{ChainParams, DescriptorChain};
use crate::driver::config::{ChannelState, StreamConfig};
use crate::driver::error::{ConfigError, Result, TransferError};
use crate::hal::transfer::TransferEngine;
use crate::internal::constants::{DEFAULT_CHAIN_CAPACITY, POLL_INTERVAL_US, SEQ_LEN};
use crate::internal::fmt::{log_debug, log_info, log_warn};
use crate::sync::FaultLatch;

/// One streaming channel of the bulk transfer engine
pub struct StreamChannel<'a, E: TransferEngine, const N: usize = DEFAULT_CHAIN_CAPACITY> {
    engine: E,
    latch: &'a FaultLatch,
    config: StreamConfig,
    configured: bool,
    chain: DescriptorChain<N>,
    token: [u16; 2],
}

impl<'a, E: TransferEngine, const N: usize> StreamChannel<'a, E, N> {
    /// Wrap an engine. Call [`configure`](Self::configure) before submitting.
    pub fn new(engine: E, latch: &'a FaultLatch) -> Self {
        Self {
            engine,
            latch,
            config: StreamConfig::default(),
            configured: false,
            chain: DescriptorChain::new(),
            token: [0; 2],
        }
    }

    /// Validate `config` and bring up the engine.
    pub fn configure(&mut self, config: StreamConfig) -> Result<()> {
        if self.configured {
            return Err(ConfigError::AlreadyConfigured.into());
        }
        config.validate()?;
        self.engine.configure(&config)?;
        self.config = config;
        self.token = config.sync_token;
        self.configured = true;
        log_info!("stream channel {} configured", config.channel);
        Ok(())
    }

    /// Current channel state
    pub fn state(&self) -> ChannelState {
        if !self.configured {
            ChannelState::Unconfigured
        } else if self.latch.is_faulted() {
            ChannelState::Faulted
        } else if self.engine.busy() {
            ChannelState::Running
        } else {
            ChannelState::Idle
        }
    }

    /// Whether the engine is still executing a chain
    pub fn busy(&self) -> bool {
        self.engine.busy()
    }

    /// Active configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Chain submitted last
    pub fn chain(&self) -> &DescriptorChain<N> {
        &self.chain
    }

    /// Build a chain over `source` and start it.
    ///
    /// `source` must stay untouched until the completion signal; the
    /// pipeline guarantees this through slot ownership.
    pub fn submit(&mut self, source: &[u8], params: &ChainParams) -> Result<()> {
        self.check_ready()?;
        self.chain
            .rebuild(source.as_ptr() as usize, source.len(), params)?;
        self.start()
    }

    /// Stream a frame's payload (everything after the sequence number).
    pub fn submit_payload(&mut self, frame: &[u8]) -> Result<()> {
        let payload = frame.get(SEQ_LEN..).unwrap_or(&[]);
        let params = self.config.payload_params();
        self.submit(payload, &params)
    }

    /// Stream the configured sync token.
    pub fn submit_token(&mut self) -> Result<()> {
        self.check_ready()?;
        let params = self.config.token_params();
        let source = self.token.as_ptr() as usize;
        self.chain
            .rebuild(source, core::mem::size_of_val(&self.token), &params)?;
        self.start()
    }

    /// Recover a faulted channel: stop, clear the latch, reconfigure.
    ///
    /// Waits up to `timeout_ms` for the engine to go idle after `stop`.
    pub fn reset<D: DelayNs>(&mut self, delay: &mut D, timeout_ms: u32) -> Result<()> {
        if !self.configured {
            return Err(TransferError::NotConfigured.into());
        }
        self.engine.stop();

        let polls = timeout_ms.saturating_mul(1000) / POLL_INTERVAL_US;
        let mut idle = !self.engine.busy();
        for _ in 0..polls {
            if idle {
                break;
            }
            delay.delay_us(POLL_INTERVAL_US);
            idle = !self.engine.busy();
        }
        if !idle {
            return Err(TransferError::Busy.into());
        }

        self.chain.clear();
        self.latch.clear();
        self.engine.configure(&self.config)?;
        log_info!("stream channel {} reset", self.config.channel);
        Ok(())
    }

    /// Give the engine back
    pub fn release(self) -> E {
        self.engine
    }

    fn check_ready(&self) -> Result<()> {
        if !self.configured {
            return Err(TransferError::NotConfigured.into());
        }
        if self.latch.is_faulted() {
            log_warn!("submission refused, channel {} faulted", self.config.channel);
            return Err(TransferError::ChannelFaulted.into());
        }
        if self.engine.busy() {
            log_debug!("submission refused, engine busy");
            return Err(TransferError::Busy.into());
        }
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.engine
            .start(self.chain.as_slice(), self.config.request)?;
        log_debug!(
            "chain started: {} descriptors, {} bytes",
            self.chain.len(),
            self.chain.total_bytes()
        );
        Ok(())
    }
}
