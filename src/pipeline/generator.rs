//! Generator role.
//!
//! Appends one sample unit per tick to the active slot. When the active
//! frame is full the next tick hands it off: the next slot is stamped with
//! a fresh sequence number and receives the new sample, then the full slot
//! is marked ready and the sender is signalled.
//!
//! The generator never waits for the sender. If the next slot is not free
//! it raises the contention indicator and applies the configured
//! [`OverrunPolicy`].

use embedded_hal::delay::DelayNs;

use super::Pipeline;
use super::frame::{AxisSample, SampleSource};
use super::slot::{Role, SlotGuard, SlotId, SlotState};
use crate::driver::config::{OverrunPolicy, PipelineConfig};
use crate::driver::error::{ConfigError, ConfigResult, IoError, IoResult};
use crate::hal::status::{Indicator, StatusIndicator};
use crate::internal::fmt::{log_error, log_trace, log_warn};
use crate::sync::event;

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Sample appended to the active frame
    Sampled,
    /// Full frame in this slot handed to the sender
    HandedOff(SlotId),
    /// Next slot still busy; overrun policy applied
    Overrun,
    /// Active slot token not acquired in time; sample dropped
    Contention,
}

/// Sample producer filling the pipeline's slots
pub struct Generator<'p, S, I, const SLOTS: usize, const CAP: usize>
where
    S: SampleSource,
    I: StatusIndicator,
{
    pipeline: &'p Pipeline<SLOTS, CAP>,
    source: S,
    status: I,
    config: PipelineConfig,
    active: SlotId,
    next_seq: u32,
}

impl<'p, S, I, const SLOTS: usize, const CAP: usize> Generator<'p, S, I, SLOTS, CAP>
where
    S: SampleSource,
    I: StatusIndicator,
{
    /// Generator starting at slot 0 with sequence number 0.
    ///
    /// Fails if `config` is invalid or its frame does not fit a slot.
    pub fn new(
        pipeline: &'p Pipeline<SLOTS, CAP>,
        source: S,
        status: I,
        config: PipelineConfig,
    ) -> ConfigResult<Self> {
        config.validate()?;
        if config.frame_len() > CAP {
            return Err(ConfigError::FrameTooLarge);
        }
        Ok(Self {
            pipeline,
            source,
            status,
            config,
            active: SlotId(0),
            next_seq: 0,
        })
    }

    /// Slot currently being filled
    pub fn active(&self) -> SlotId {
        self.active
    }

    /// Sequence number the next frame will carry
    pub fn next_sequence(&self) -> u32 {
        self.next_seq
    }

    /// Produce one sample and place it.
    ///
    /// Errors only on a broken slot protocol; contention and overrun are
    /// reported as outcomes.
    pub fn tick<D: DelayNs>(&mut self, delay: &mut D) -> IoResult<TickOutcome> {
        let sample = self.source.next_sample();
        let pipeline = self.pipeline;

        let Some(slot) = pipeline.slot(self.active) else {
            return Err(IoError::InvalidTransition);
        };
        let mut current = match slot.acquire(Role::Generator, self.config.acquire_timeout, delay) {
            Ok(guard) => guard,
            Err(_) => {
                log_warn!("slot {} contention, sample dropped", self.active.0);
                self.contention();
                return Ok(TickOutcome::Contention);
            }
        };

        if current.state() == SlotState::Free {
            let seq = self.take_sequence();
            current.begin_fill(seq)?;
        }
        if current.frame().sample_count() < self.config.samples_per_frame {
            current.frame_mut()?.push_sample(sample)?;
            return Ok(TickOutcome::Sampled);
        }

        self.hand_off(current, sample, delay)
    }

    /// Tick forever at the configured sample period.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        loop {
            if let Err(e) = self.tick(delay) {
                log_error!("generator: {}", e.as_str());
            }
            delay.delay_ms(self.config.sample_period_ms);
        }
    }

    fn hand_off<D: DelayNs>(
        &mut self,
        mut current: SlotGuard<'p, CAP>,
        sample: AxisSample,
        delay: &mut D,
    ) -> IoResult<TickOutcome> {
        let pipeline = self.pipeline;
        let next_id = pipeline.next_slot(self.active);
        let Some(next_slot) = pipeline.slot(next_id) else {
            return Err(IoError::InvalidTransition);
        };

        let mut next = match next_slot.acquire(Role::Generator, self.config.acquire_timeout, delay) {
            Ok(guard) if guard.state() == SlotState::Free => guard,
            _ => return self.overrun(current, sample),
        };
        let seq = self.take_sequence();
        next.begin_fill(seq)?;
        next.frame_mut()?.push_sample(sample)?;

        current.mark_ready()?;
        let full = current.id();
        drop(current);
        drop(next);

        self.active = next_id;
        pipeline.events().set(event::ready(full.0));
        log_trace!("slot {} handed off, filling slot {} with seq {}", full.0, next_id.0, seq);
        Ok(TickOutcome::HandedOff(full))
    }

    fn overrun(
        &mut self,
        mut current: SlotGuard<'p, CAP>,
        sample: AxisSample,
    ) -> IoResult<TickOutcome> {
        self.pipeline.state().record_overrun();
        self.status.raise(Indicator::Contention);

        match self.config.overrun_policy {
            OverrunPolicy::OverwriteOldest => {
                let seq = self.take_sequence();
                current.restart_fill(seq)?;
                current.frame_mut()?.push_sample(sample)?;
                log_warn!("sender behind, slot {} overwritten as seq {}", current.id().0, seq);
            }
            OverrunPolicy::DropSample => {
                log_warn!("sender behind, sample dropped");
            }
        }
        Ok(TickOutcome::Overrun)
    }

    fn contention(&self) {
        self.pipeline.state().record_contention();
        self.status.raise(Indicator::Contention);
    }

    fn take_sequence(&mut self) -> u32 {
        let seq = self.next_seq;
        self.next_seq = self.config.sequence_width.next(seq);
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::config::Timeout;
    use crate::hal::status::StatusFlags;
    use crate::internal::constants::MAX_FRAME_LEN;
    use crate::pipeline::frame::CounterSource;
    use crate::testing::MockDelay;

    type TestPipeline = Pipeline<2, MAX_FRAME_LEN>;

    fn config(samples: usize) -> PipelineConfig {
        PipelineConfig::new()
            .with_samples_per_frame(samples)
            .with_acquire_timeout(Timeout::Millis(0))
    }

    fn generator<'p>(
        pipeline: &'p TestPipeline,
        status: &'p StatusFlags,
        config: PipelineConfig,
    ) -> Generator<'p, CounterSource, &'p StatusFlags, 2, MAX_FRAME_LEN> {
        Generator::new(pipeline, CounterSource::new(), status, config).unwrap()
    }

    #[test]
    fn rejects_frames_larger_than_slot() {
        let pipeline: Pipeline<2, 16> = Pipeline::new();
        let status = StatusFlags::new();
        let result = Generator::new(&pipeline, CounterSource::new(), &status, config(3));
        assert!(matches!(result, Err(ConfigError::FrameTooLarge)));
    }

    #[test]
    fn first_frame_carries_sequence_zero() {
        let pipeline = TestPipeline::new();
        let status = StatusFlags::new();
        let mut generator = generator(&pipeline, &status, config(2));
        let mut delay = MockDelay::new();

        assert_eq!(generator.tick(&mut delay), Ok(TickOutcome::Sampled));
        let slot = pipeline.slot(SlotId(0)).unwrap();
        assert_eq!(slot.state(), SlotState::Filling);
        assert_eq!(generator.next_sequence(), 1);
        assert_eq!(pipeline.events().peek(), 0);
    }

    #[test]
    fn full_frame_is_handed_off_on_next_sample() {
        let pipeline = TestPipeline::new();
        let status = StatusFlags::new();
        let mut generator = generator(&pipeline, &status, config(2));
        let mut delay = MockDelay::new();

        generator.tick(&mut delay).unwrap();
        generator.tick(&mut delay).unwrap();
        assert_eq!(pipeline.slot(SlotId(0)).unwrap().state(), SlotState::Filling);

        assert_eq!(generator.tick(&mut delay), Ok(TickOutcome::HandedOff(SlotId(0))));
        assert_eq!(pipeline.slot(SlotId(0)).unwrap().state(), SlotState::ReadyToSend);
        assert_eq!(pipeline.slot(SlotId(1)).unwrap().state(), SlotState::Filling);
        assert_eq!(generator.active(), SlotId(1));
        assert_eq!(pipeline.events().peek(), event::ready(0));

        let guard = pipeline.slot(SlotId(1)).unwrap().try_acquire(Role::Sender).unwrap();
        assert_eq!(guard.frame().sequence(), Some(1));
        assert_eq!(guard.frame().sample_count(), 1);
        assert_eq!(guard.frame().payload()[..2], [0, 2]);
    }

    #[test]
    fn overrun_overwrites_with_new_sequence() {
        let pipeline = TestPipeline::new();
        let status = StatusFlags::new();
        let mut generator = generator(&pipeline, &status, config(1));
        let mut delay = MockDelay::new();

        generator.tick(&mut delay).unwrap();
        assert_eq!(generator.tick(&mut delay), Ok(TickOutcome::HandedOff(SlotId(0))));
        // Nobody consumes slot 0, so slot 1 cannot hand off
        assert_eq!(generator.tick(&mut delay), Ok(TickOutcome::Overrun));

        assert!(status.is_raised(Indicator::Contention));
        assert_eq!(pipeline.state().stats().overruns, 1);
        assert_eq!(generator.active(), SlotId(1));

        let guard = pipeline.slot(SlotId(1)).unwrap().try_acquire(Role::Sender).unwrap();
        assert_eq!(guard.frame().sequence(), Some(2));
        assert_eq!(guard.frame().sample_count(), 1);
        assert_eq!(guard.frame().payload()[..2], [0, 2]);
    }

    #[test]
    fn overrun_can_drop_the_sample_instead() {
        let pipeline = TestPipeline::new();
        let status = StatusFlags::new();
        let cfg = config(1).with_overrun_policy(OverrunPolicy::DropSample);
        let mut generator = generator(&pipeline, &status, cfg);
        let mut delay = MockDelay::new();

        generator.tick(&mut delay).unwrap();
        generator.tick(&mut delay).unwrap();
        assert_eq!(generator.tick(&mut delay), Ok(TickOutcome::Overrun));

        let guard = pipeline.slot(SlotId(1)).unwrap().try_acquire(Role::Sender).unwrap();
        assert_eq!(guard.frame().sequence(), Some(1));
        assert_eq!(guard.frame().payload()[..2], [0, 1]);
        assert_eq!(generator.next_sequence(), 2);
    }

    #[test]
    fn held_slot_drops_sample_with_contention() {
        let pipeline = TestPipeline::new();
        let status = StatusFlags::new();
        let mut generator = generator(&pipeline, &status, config(2));
        let mut delay = MockDelay::new();

        let held = pipeline.slot(SlotId(0)).unwrap().try_acquire(Role::Sender).unwrap();
        assert_eq!(generator.tick(&mut delay), Ok(TickOutcome::Contention));
        assert_eq!(pipeline.state().stats().contention, 1);
        assert!(status.is_raised(Indicator::Contention));
        drop(held);

        assert_eq!(generator.tick(&mut delay), Ok(TickOutcome::Sampled));
    }

    #[test]
    fn sixteen_bit_sequence_wraps() {
        use crate::driver::config::SequenceWidth;

        let pipeline = TestPipeline::new();
        let status = StatusFlags::new();
        let cfg = config(1).with_sequence_width(SequenceWidth::Bits16);
        let mut generator = generator(&pipeline, &status, cfg);
        generator.next_seq = u16::MAX.into();

        assert_eq!(generator.take_sequence(), 0xFFFF);
        assert_eq!(generator.next_sequence(), 0);
    }
}
