//! Receive and forward path.
//!
//! The radio's receive handler copies each inbound payload into a
//! [`FrameInbox`] without blocking. A [`Forwarder`] task takes frames out
//! with a bounded wait, runs the loss checks, and streams the payload (the
//! bytes after the sequence number) through its transfer engine channel.
//! When the engine is still busy the frame is dropped and the contention
//! indicator raised; nothing is queued behind the engine.

use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use heapless::spsc::Queue;

use super::frame::read_sequence;
use super::state::PipelineState;
use super::tracker::{ContentCheck, LossTracker, SequenceCheck};
use crate::driver::channel::StreamChannel;
use crate::driver::config::{PipelineConfig, Timeout};
use crate::driver::error::{IoError, IoResult, Result};
use crate::hal::radio::ReceiveHandler;
use crate::hal::status::{Indicator, StatusIndicator};
use crate::hal::transfer::TransferEngine;
use crate::internal::constants::{MAX_FRAME_LEN, POLL_INTERVAL_US, RX_QUEUE_DEPTH, SEQ_LEN};
use crate::internal::fmt::{log_debug, log_error, log_info, log_warn};
use crate::sync::CriticalSectionCell;

/// One inbound payload
pub type InboundFrame = Vec<u8, MAX_FRAME_LEN>;

/// Bounded queue between the radio receive handler and the forwarder
pub struct FrameInbox<I: StatusIndicator> {
    queue: CriticalSectionCell<Queue<InboundFrame, RX_QUEUE_DEPTH>>,
    dropped: AtomicU32,
    status: I,
}

impl<I: StatusIndicator> FrameInbox<I> {
    /// Empty inbox (const, suitable for static initialization)
    pub const fn new(status: I) -> Self {
        Self {
            queue: CriticalSectionCell::new(Queue::new()),
            dropped: AtomicU32::new(0),
            status,
        }
    }

    /// Copy `payload` in. Never blocks.
    ///
    /// A full queue drops the frame and raises the contention indicator.
    pub fn push(&self, payload: &[u8]) -> IoResult<()> {
        let frame = InboundFrame::from_slice(payload).map_err(|()| IoError::FrameTooLarge)?;
        if self.queue.with(|q| q.enqueue(frame)).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            self.status.raise(Indicator::Contention);
            return Err(IoError::QueueFull);
        }
        Ok(())
    }

    /// Oldest frame, if any
    pub fn pop(&self) -> Option<InboundFrame> {
        self.queue.with(|q| q.dequeue())
    }

    /// Wait up to `timeout` for a frame.
    pub fn recv<D: DelayNs>(&self, timeout: Timeout, delay: &mut D) -> IoResult<InboundFrame> {
        let mut remaining = match timeout {
            Timeout::Forever => None,
            Timeout::Millis(ms) => Some(ms.saturating_mul(1000) / POLL_INTERVAL_US),
        };
        loop {
            if let Some(frame) = self.pop() {
                return Ok(frame);
            }
            match remaining.as_mut() {
                Some(0) => return Err(IoError::Timeout),
                Some(n) => *n -= 1,
                None => {}
            }
            delay.delay_us(POLL_INTERVAL_US);
        }
    }

    /// Frames waiting
    pub fn len(&self) -> usize {
        self.queue.with_ref(|q| q.len())
    }

    /// Nothing waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames dropped on a full queue since the last call
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

impl<I: StatusIndicator + Sync> ReceiveHandler for FrameInbox<I> {
    fn on_frame(&self, payload: &[u8]) {
        if let Err(e) = self.push(payload) {
            log_debug!("inbound frame dropped: {}", e.as_str());
        }
    }
}

/// What one forwarder round did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ForwardOutcome {
    /// No frame arrived within the wait
    Idle,
    /// Payload of this sequence number is streaming out
    Forwarded(u32),
    /// Engine busy; frame dropped
    Dropped(u32),
    /// Frame unusable or refused by the channel
    Rejected,
}

#[repr(C, align(4))]
struct Staging([u8; MAX_FRAME_LEN]);

/// Receive-side task streaming inbound frames to the serial output.
///
/// The transfer engine reads from the forwarder's staging buffer; do not
/// move the forwarder while a transfer is running.
pub struct Forwarder<'a, E, I, Q, const N: usize>
where
    E: TransferEngine,
    I: StatusIndicator,
    Q: StatusIndicator,
{
    inbox: &'a FrameInbox<Q>,
    channel: StreamChannel<'a, E, N>,
    state: &'a PipelineState,
    status: I,
    config: PipelineConfig,
    tracker: LossTracker,
    content: ContentCheck,
    staging: Staging,
}

impl<'a, E, I, Q, const N: usize> Forwarder<'a, E, I, Q, N>
where
    E: TransferEngine,
    I: StatusIndicator,
    Q: StatusIndicator,
{
    /// Forwarder over a configured channel
    pub fn new(
        inbox: &'a FrameInbox<Q>,
        channel: StreamChannel<'a, E, N>,
        state: &'a PipelineState,
        status: I,
        config: PipelineConfig,
    ) -> Self {
        Self {
            inbox,
            channel,
            state,
            status,
            config,
            tracker: LossTracker::new(config.sequence_width),
            content: ContentCheck::new(),
            staging: Staging([0; MAX_FRAME_LEN]),
        }
    }

    /// Underlying channel
    pub fn channel(&self) -> &StreamChannel<'a, E, N> {
        &self.channel
    }

    /// Underlying channel, for [`reset`](StreamChannel::reset) after a fault
    pub fn channel_mut(&mut self) -> &mut StreamChannel<'a, E, N> {
        &mut self.channel
    }

    /// Stream the sync token if the channel is configured to.
    pub fn start(&mut self) -> Result<()> {
        if self.channel.config().emit_token_at_start {
            self.channel.submit_token()?;
            log_info!("sync token sent");
        }
        Ok(())
    }

    /// Take one frame and forward it.
    pub fn service<D: DelayNs>(&mut self, delay: &mut D) -> ForwardOutcome {
        for _ in 0..self.inbox.take_dropped() {
            self.state.record_contention();
        }

        let Ok(frame) = self.inbox.recv(self.config.receive_timeout, delay) else {
            return ForwardOutcome::Idle;
        };
        let Some(seq) = read_sequence(&frame) else {
            log_warn!("runt frame of {} bytes", frame.len());
            return ForwardOutcome::Rejected;
        };

        if let SequenceCheck::Gap { missing } = self.tracker.observe(seq) {
            log_info!("Message lost {}", missing);
            self.state.record_loss(missing);
            self.status.raise(Indicator::Loss);
        }
        let payload = &frame[SEQ_LEN..];
        if !self.content.inspect(payload) {
            log_debug!("seq {} content implausible", seq);
            self.state.record_suspect_content();
        }
        self.state.record_frame(seq, payload.len());

        if self.channel.busy() {
            log_warn!("stream busy, seq {} dropped", seq);
            self.state.record_busy_drop();
            self.status.raise(Indicator::Contention);
            return ForwardOutcome::Dropped(seq);
        }

        let staged = &mut self.staging.0[..frame.len()];
        staged.copy_from_slice(&frame);
        match self.channel.submit_payload(staged) {
            Ok(()) => {
                self.status.toggle(Indicator::Activity);
                ForwardOutcome::Forwarded(seq)
            }
            Err(e) => {
                log_warn!("seq {} not forwarded: {}", seq, e);
                self.state.record_link_error();
                ForwardOutcome::Rejected
            }
        }
    }

    /// Send the token, then forward forever.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        if let Err(e) = self.start() {
            log_error!("sync token not sent: {}", e);
        }
        loop {
            self.service(delay);
        }
    }
}
