//! Event flags.
//!
//! A 32-bit set of "work may proceed" bits. Setting is a single atomic OR, so
//! it is safe from interrupt context and never blocks; a set that races with
//! a waiter is never lost because the waiter consumes bits with an atomic
//! AND instead of a separate read and clear.

use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;

#[cfg(feature = "async")]
use super::primitives::AtomicWaker;
use crate::driver::config::Timeout;
use crate::driver::error::{IoError, IoResult};
use crate::internal::constants::{MAX_SLOTS, POLL_INTERVAL_US};

/// Bit assignments used by the pipeline.
pub mod event {
    use super::MAX_SLOTS;

    /// Slot `slot` is ready to send
    #[inline(always)]
    pub const fn ready(slot: u8) -> u32 {
        1 << (slot as u32 % MAX_SLOTS as u32)
    }

    /// Send of slot `slot` completed
    #[inline(always)]
    pub const fn sent(slot: u8) -> u32 {
        1 << (MAX_SLOTS as u32 + slot as u32 % MAX_SLOTS as u32)
    }

    /// Ready bits of the first `slots` slots
    #[inline(always)]
    pub const fn ready_mask(slots: usize) -> u32 {
        (1 << slots) - 1
    }

    /// Descriptor chain finished
    pub const CHAIN_DONE: u32 = 1 << 16;

    /// Transfer engine reported an error
    pub const CHAIN_ERROR: u32 = 1 << 17;

    /// Link layer gave up on the send of slot `slot`
    #[inline(always)]
    pub const fn send_failed(slot: u8) -> u32 {
        1 << (18 + slot as u32 % MAX_SLOTS as u32)
    }

    /// All `send_failed` bits
    pub const SEND_FAILED_MASK: u32 = 0xFF << 18;
}

/// Atomic event flags with polling and async waits
pub struct EventFlags {
    bits: AtomicU32,
    #[cfg(feature = "async")]
    waker: AtomicWaker,
}

impl Default for EventFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFlags {
    /// No flags set
    pub const fn new() -> Self {
        Self {
            bits: AtomicU32::new(0),
            #[cfg(feature = "async")]
            waker: AtomicWaker::new(),
        }
    }

    /// Set `mask`. Interrupt safe.
    #[inline]
    pub fn set(&self, mask: u32) {
        self.bits.fetch_or(mask, Ordering::AcqRel);
        #[cfg(feature = "async")]
        self.waker.wake();
    }

    /// Clear `mask` without reporting what was set.
    #[inline]
    pub fn clear(&self, mask: u32) {
        self.bits.fetch_and(!mask, Ordering::AcqRel);
    }

    /// Currently set bits.
    #[inline]
    pub fn peek(&self) -> u32 {
        self.bits.load(Ordering::Acquire)
    }

    /// Clear `mask` and return which of its bits were set.
    #[inline]
    pub fn take(&self, mask: u32) -> u32 {
        self.bits.fetch_and(!mask, Ordering::AcqRel) & mask
    }

    /// Wait until any bit of `mask` is set, consume those bits and return them.
    ///
    /// Polls every `POLL_INTERVAL_US`. [`IoError::Timeout`] when a bounded
    /// wait expires; `Timeout::Millis(0)` checks exactly once.
    pub fn wait_any<D: DelayNs>(
        &self,
        mask: u32,
        timeout: Timeout,
        delay: &mut D,
    ) -> IoResult<u32> {
        match timeout {
            Timeout::Forever => loop {
                let got = self.take(mask);
                if got != 0 {
                    return Ok(got);
                }
                delay.delay_us(POLL_INTERVAL_US);
            },
            Timeout::Millis(ms) => {
                let polls = ms.saturating_mul(1000) / POLL_INTERVAL_US;
                for _ in 0..polls {
                    let got = self.take(mask);
                    if got != 0 {
                        return Ok(got);
                    }
                    delay.delay_us(POLL_INTERVAL_US);
                }
                match self.take(mask) {
                    0 => Err(IoError::Timeout),
                    got => Ok(got),
                }
            }
        }
    }

    /// Async variant of [`wait_any`](Self::wait_any) without a timeout.
    ///
    /// Combine with your executor's timer for a bounded wait.
    #[cfg(feature = "async")]
    pub async fn wait_any_async(&self, mask: u32) -> u32 {
        core::future::poll_fn(|cx| {
            let got = self.take(mask);
            if got != 0 {
                return core::task::Poll::Ready(got);
            }
            self.waker.register(cx.waker());
            // A set between the take and the register would otherwise be missed
            match self.take(mask) {
                0 => core::task::Poll::Pending,
                got => core::task::Poll::Ready(got),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDelay;

    #[test]
    fn event_bits_do_not_overlap() {
        let mut seen = 0u32;
        for slot in 0..MAX_SLOTS as u8 {
            for bit in [event::ready(slot), event::sent(slot), event::send_failed(slot)] {
                assert_eq!(seen & bit, 0);
                seen |= bit;
            }
        }
        assert_eq!(seen & (event::CHAIN_DONE | event::CHAIN_ERROR), 0);
        assert_eq!(event::ready_mask(2), event::ready(0) | event::ready(1));
    }

    #[test]
    fn take_consumes_only_masked_bits() {
        let flags = EventFlags::new();
        flags.set(event::ready(0) | event::CHAIN_DONE);

        assert_eq!(flags.take(event::ready(0) | event::ready(1)), event::ready(0));
        assert_eq!(flags.peek(), event::CHAIN_DONE);
        assert_eq!(flags.take(event::ready(0)), 0);
    }

    #[test]
    fn clear_drops_stale_bits() {
        let flags = EventFlags::new();
        flags.set(event::sent(1));
        flags.clear(event::sent(1));
        assert_eq!(flags.peek(), 0);
    }

    #[test]
    fn wait_returns_immediately_when_set() {
        let flags = EventFlags::new();
        let mut delay = MockDelay::new();
        flags.set(event::ready(1));

        let got = flags.wait_any(event::ready_mask(2), Timeout::Forever, &mut delay);
        assert_eq!(got, Ok(event::ready(1)));
        assert_eq!(delay.total_ns(), 0);
        assert_eq!(flags.peek(), 0);
    }

    #[test]
    fn bounded_wait_times_out() {
        let flags = EventFlags::new();
        let mut delay = MockDelay::new();

        let got = flags.wait_any(event::CHAIN_DONE, Timeout::Millis(2), &mut delay);
        assert_eq!(got, Err(IoError::Timeout));
        assert_eq!(delay.total_ns(), 2_000_000);
    }

    #[test]
    fn zero_timeout_checks_once() {
        let flags = EventFlags::new();
        let mut delay = MockDelay::new();
        assert_eq!(
            flags.wait_any(event::CHAIN_DONE, Timeout::Millis(0), &mut delay),
            Err(IoError::Timeout)
        );

        flags.set(event::CHAIN_DONE);
        assert_eq!(
            flags.wait_any(event::CHAIN_DONE, Timeout::Millis(0), &mut delay),
            Ok(event::CHAIN_DONE)
        );
        assert_eq!(delay.total_ns(), 0);
    }

    #[test]
    fn set_from_other_thread_wakes_waiter() {
        extern crate std;
        use crate::testing::YieldDelay;
        use std::sync::Arc;

        let flags = Arc::new(EventFlags::new());
        let setter = {
            let flags = Arc::clone(&flags);
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(5));
                flags.set(event::CHAIN_DONE);
            })
        };

        let got = flags.wait_any(event::CHAIN_DONE, Timeout::Forever, &mut YieldDelay);
        assert_eq!(got, Ok(event::CHAIN_DONE));
        setter.join().unwrap();
    }

    #[cfg(feature = "async")]
    #[test]
    fn async_wait_registers_and_wakes() {
        use crate::testing::CountingWaker;
        use core::future::Future;
        use core::pin::pin;
        use core::task::{Context, Poll};

        let flags = EventFlags::new();
        let counter = CountingWaker::new();
        let waker = counter.waker();
        let mut cx = Context::from_waker(&waker);
        let mut fut = pin!(flags.wait_any_async(event::CHAIN_DONE));

        assert!(fut.as_mut().poll(&mut cx).is_pending());
        flags.set(event::CHAIN_DONE);
        assert_eq!(counter.count(), 1);
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(event::CHAIN_DONE));
    }
}
