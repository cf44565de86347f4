//! Sender role and transports.
//!
//! The sender waits for a "slot ready" bit, moves that slot to `Sending`,
//! submits the frame and drops the token. It then waits (bounded) for the
//! completion bits of that submission and frees the slot. A completion that
//! never arrives is recorded and the slot is freed anyway so the generator
//! cannot deadlock.
//!
//! Radio completions carry the send generation and are dropped once the
//! sender has given up on that send. Completion bits are also cleared
//! before each submission, which covers the stream transport's shared
//! chain bits.

use embedded_hal::delay::DelayNs;

use super::Pipeline;
use super::slot::{Role, SlotId};
use crate::descriptor::DescriptorChain;
use crate::driver::channel::StreamChannel;
use crate::driver::config::{PipelineConfig, Timeout};
use crate::driver::error::{IoError, IoResult, Result, TransferError};
use crate::hal::radio::{RadioLink, SendToken};
use crate::hal::status::{Indicator, StatusIndicator};
use crate::hal::transfer::TransferEngine;
use crate::internal::constants::MAX_FRAME_LEN;
use crate::internal::fmt::{log_debug, log_error, log_warn};
use crate::sync::event;

/// Where the sender puts frames
pub trait Transport {
    /// Start sending `frame` for `token`. Must not block on completion.
    fn submit(&mut self, token: SendToken, frame: &[u8]) -> Result<()>;

    /// Event bits that signal completion of a submission from `slot`
    fn completion_mask(&self, slot: SlotId) -> u32;

    /// Interpret the completion bits that arrived
    fn on_completion(&mut self, bits: u32) -> Result<()>;
}

/// Sends whole frames over the radio link.
///
/// The link layer must report every accepted send through
/// [`Pipeline::on_send_complete`].
pub struct RadioTransport<R: RadioLink> {
    radio: R,
}

impl<R: RadioLink> RadioTransport<R> {
    /// Wrap a radio link
    pub fn new(radio: R) -> Self {
        Self { radio }
    }

    /// Give the radio back
    pub fn release(self) -> R {
        self.radio
    }
}

impl<R: RadioLink> Transport for RadioTransport<R> {
    fn submit(&mut self, token: SendToken, frame: &[u8]) -> Result<()> {
        if frame.len() > MAX_FRAME_LEN {
            return Err(IoError::FrameTooLarge.into());
        }
        self.radio.send(frame, token)?;
        Ok(())
    }

    fn completion_mask(&self, slot: SlotId) -> u32 {
        event::sent(slot.0) | event::send_failed(slot.0)
    }

    fn on_completion(&mut self, bits: u32) -> Result<()> {
        if bits & event::SEND_FAILED_MASK != 0 {
            return Err(IoError::LinkError.into());
        }
        Ok(())
    }
}

/// Streams frame payloads through the transfer engine.
///
/// The completion bridge for the channel must post into the same
/// [`EventFlags`](crate::sync::EventFlags) as the pipeline.
pub struct StreamTransport<'a, E: TransferEngine, const N: usize> {
    channel: StreamChannel<'a, E, N>,
}

impl<'a, E: TransferEngine, const N: usize> StreamTransport<'a, E, N> {
    /// Wrap a configured channel
    pub fn new(channel: StreamChannel<'a, E, N>) -> Self {
        Self { channel }
    }

    /// Underlying channel
    pub fn channel(&self) -> &StreamChannel<'a, E, N> {
        &self.channel
    }

    /// Underlying channel, for [`reset`](StreamChannel::reset) after a fault
    pub fn channel_mut(&mut self) -> &mut StreamChannel<'a, E, N> {
        &mut self.channel
    }

    /// Chain submitted last
    pub fn chain(&self) -> &DescriptorChain<N> {
        self.channel.chain()
    }

    /// Give the channel back
    pub fn release(self) -> StreamChannel<'a, E, N> {
        self.channel
    }
}

impl<E: TransferEngine, const N: usize> Transport for StreamTransport<'_, E, N> {
    fn submit(&mut self, _token: SendToken, frame: &[u8]) -> Result<()> {
        self.channel.submit_payload(frame)
    }

    fn completion_mask(&self, _slot: SlotId) -> u32 {
        event::CHAIN_DONE | event::CHAIN_ERROR
    }

    fn on_completion(&mut self, bits: u32) -> Result<()> {
        if bits & event::CHAIN_ERROR != 0 {
            return Err(TransferError::HardwareError.into());
        }
        Ok(())
    }
}

/// What one service round did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendReport {
    /// No slot became ready within the wait
    Idle,
    /// Frame from this slot went out
    Sent(SlotId),
    /// Transport refused or failed the frame; slot freed
    Failed(SlotId),
    /// Completion never arrived; slot freed
    TimedOut(SlotId),
    /// Slot token not acquired; ready bit re-posted
    Contention(SlotId),
}

/// Frame consumer draining ready slots into a transport
pub struct Sender<'p, T, I, const SLOTS: usize, const CAP: usize>
where
    T: Transport,
    I: StatusIndicator,
{
    pipeline: &'p Pipeline<SLOTS, CAP>,
    transport: T,
    status: I,
    config: PipelineConfig,
    next: SlotId,
}

impl<'p, T, I, const SLOTS: usize, const CAP: usize> Sender<'p, T, I, SLOTS, CAP>
where
    T: Transport,
    I: StatusIndicator,
{
    /// Sender over `transport`
    pub fn new(pipeline: &'p Pipeline<SLOTS, CAP>, transport: T, status: I, config: PipelineConfig) -> Self {
        Self {
            pipeline,
            transport,
            status,
            config,
            next: SlotId(0),
        }
    }

    /// Transport in use
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Transport in use, mutable
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Wait for one ready slot and send it.
    ///
    /// Errors only on a broken slot protocol; transport failures and
    /// timeouts are recorded and reported as outcomes.
    pub fn service<D: DelayNs>(&mut self, delay: &mut D) -> IoResult<SendReport> {
        let pipeline = self.pipeline;
        let events = pipeline.events();

        let ready = match events.wait_any(event::ready_mask(SLOTS), self.config.ready_timeout, delay) {
            Ok(bits) => bits,
            Err(_) => return Ok(SendReport::Idle),
        };
        let id = self.pick(ready);
        let others = ready & !event::ready(id.0);
        if others != 0 {
            events.set(others);
        }

        let Some(slot) = pipeline.slot(id) else {
            return Err(IoError::InvalidTransition);
        };
        let mask = self.transport.completion_mask(id);
        events.clear(mask);

        let mut guard = match slot.acquire(Role::Sender, self.config.acquire_timeout, delay) {
            Ok(guard) => guard,
            Err(_) => {
                log_warn!("slot {} contention, send deferred", id.0);
                events.set(event::ready(id.0));
                pipeline.state().record_contention();
                self.status.raise(Indicator::Contention);
                return Ok(SendReport::Contention(id));
            }
        };

        let frame = guard.begin_send()?;
        let token = SendToken {
            slot: id,
            generation: slot.send_generation(),
        };
        let seq = frame.sequence().unwrap_or_default();
        let len = frame.payload().len();
        if let Err(e) = self.transport.submit(token, frame.as_bytes()) {
            log_warn!("slot {} seq {} not submitted: {}", id.0, seq, e);
            guard.finish_send()?;
            pipeline.state().record_link_error();
            return Ok(SendReport::Failed(id));
        }
        drop(guard);
        self.next = pipeline.next_slot(id);
        log_debug!("slot {} seq {} submitted", id.0, seq);

        let report = match events.wait_any(mask, self.config.completion_timeout, delay) {
            Ok(bits) => match self.transport.on_completion(bits) {
                Ok(()) => {
                    pipeline.state().record_frame(seq, len);
                    SendReport::Sent(id)
                }
                Err(e) => {
                    log_error!("slot {} seq {} failed: {}", id.0, seq, e);
                    pipeline.state().record_link_error();
                    SendReport::Failed(id)
                }
            },
            Err(_) => {
                log_warn!("slot {} seq {} completion timed out", id.0, seq);
                pipeline.state().record_timeout();
                SendReport::TimedOut(id)
            }
        };

        // Generator only holds this token for a moment
        slot.acquire(Role::Sender, Timeout::Forever, delay)?.finish_send()?;
        Ok(report)
    }

    /// Service forever.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        loop {
            if let Err(e) = self.service(delay) {
                log_error!("sender: {}", e.as_str());
            }
        }
    }

    /// First ready slot at or after the one expected next
    fn pick(&self, ready: u32) -> SlotId {
        (0..SLOTS)
            .map(|offset| SlotId(((self.next.index() + offset) % SLOTS) as u8))
            .find(|id| ready & event::ready(id.0) != 0)
            .unwrap_or(self.next)
    }
}
