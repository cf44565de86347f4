//! Testing utilities and mock implementations
//!
//! Host-side stand-ins for the transfer engine, its interrupt, the radio
//! link, output pins and delays. The engine mock executes descriptor chains
//! against real memory so tests can check the bytes a serial peripheral
//! would emit.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::descriptor::{SourceAddress, TransferDescriptor, UnitSize};
use crate::driver::config::{RequestSignal, StreamConfig};
use crate::driver::error::{IoError, IoResult, TransferError, TransferResult};
use crate::driver::interrupt::TransferStatus;
use crate::hal::radio::{RadioLink, ReceiveHandler, SendToken};
use crate::hal::transfer::{TransferEngine, TransferInterrupt};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Records delays without waiting.
#[derive(Debug, Default)]
pub struct MockDelay {
    total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total nanoseconds "delayed"
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }

    /// Total milliseconds "delayed"
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

/// Yields the thread instead of sleeping; for multi-threaded tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct YieldDelay;

impl DelayNs for YieldDelay {
    fn delay_ns(&mut self, _ns: u32) {
        std::thread::yield_now();
    }
}

/// Yields, sleeps briefly or returns at once on a seeded schedule, so
/// multi-threaded tests see different interleavings per seed.
#[derive(Debug, Clone)]
pub struct JitterDelay {
    state: u64,
}

impl JitterDelay {
    pub fn new(seed: u64) -> Self {
        Self { state: seed | 1 }
    }

    /// One scheduling hiccup
    pub fn pause(&mut self) {
        // xorshift64
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        match self.state % 4 {
            0 => std::thread::sleep(std::time::Duration::from_micros(self.state % 40)),
            1 => {}
            _ => std::thread::yield_now(),
        }
    }
}

impl DelayNs for JitterDelay {
    fn delay_ns(&mut self, _ns: u32) {
        self.pause();
    }
}

// =============================================================================
// Mock Transfer Engine
// =============================================================================

#[derive(Debug, Default)]
struct EngineState {
    channel: u8,
    configure_count: usize,
    start_count: usize,
    stop_count: usize,
    start_while_busy: usize,
    busy: bool,
    stuck: bool,
    pending: TransferStatus,
    clear_count: usize,
    last_chain: Vec<TransferDescriptor>,
    last_request: RequestSignal,
    wire: Vec<u8>,
}

/// Transfer engine that executes chains against host memory.
///
/// `start` copies the bytes the chain describes to [`wire`](Self::wire)
/// immediately and stays busy until the test calls
/// [`complete`](Self::complete) or [`fail`](Self::fail). Clones share state,
/// so a test keeps one clone to inspect the hardware side and hands the
/// other to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<EngineState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupt handle sharing this engine's pending flags
    pub fn interrupt(&self) -> MockInterrupt {
        MockInterrupt {
            state: Arc::clone(&self.state),
        }
    }

    /// Finish the running chain and raise the channel's DONE flag
    pub fn complete(&self) {
        let mut s = lock(&self.state);
        s.busy = false;
        let done = TransferStatus::done_for(s.channel);
        s.pending.done_mask |= done.done_mask;
    }

    /// Abort the running chain and raise the error flag
    pub fn fail(&self) {
        let mut s = lock(&self.state);
        s.busy = false;
        s.pending.error = true;
    }

    /// Keep reporting busy even after `stop`
    pub fn set_stuck(&self, stuck: bool) {
        lock(&self.state).stuck = stuck;
    }

    pub fn configure_count(&self) -> usize {
        lock(&self.state).configure_count
    }

    pub fn start_count(&self) -> usize {
        lock(&self.state).start_count
    }

    pub fn stop_count(&self) -> usize {
        lock(&self.state).stop_count
    }

    /// Number of `start` calls that violated the not-busy contract
    pub fn start_while_busy(&self) -> usize {
        lock(&self.state).start_while_busy
    }

    /// Descriptors of the last started chain
    pub fn last_chain(&self) -> Vec<TransferDescriptor> {
        lock(&self.state).last_chain.clone()
    }

    pub fn last_request(&self) -> RequestSignal {
        lock(&self.state).last_request
    }

    /// Every byte emitted so far
    pub fn wire(&self) -> Vec<u8> {
        lock(&self.state).wire.clone()
    }

    /// Walk the chain like the hardware: absolute or relative source, fixed
    /// destination, optional byte swap, stop at the first unlinked descriptor.
    fn execute(chain: &[TransferDescriptor], wire: &mut Vec<u8>) {
        let mut cursor = 0usize;
        for desc in chain {
            cursor = match desc.source() {
                SourceAddress::Absolute(addr) => addr,
                SourceAddress::Relative(offset) => cursor.wrapping_add_signed(offset as isize),
            };
            let size = desc.unit_size().bytes();
            for _ in 0..desc.units() {
                let mut unit = [0u8; 4];
                for (i, b) in unit.iter_mut().take(size).enumerate() {
                    // SAFETY: tests only submit chains over live buffers.
                    *b = unsafe { core::ptr::read((cursor + i) as *const u8) };
                }
                let value = match desc.unit_size() {
                    UnitSize::Byte => u32::from(unit[0]),
                    UnitSize::HalfWord => u32::from(u16::from_ne_bytes([unit[0], unit[1]])),
                    UnitSize::Word => u32::from_ne_bytes(unit),
                };
                let value = match (desc.byte_swap(), desc.unit_size()) {
                    (true, UnitSize::HalfWord) => u32::from((value as u16).swap_bytes()),
                    (true, UnitSize::Word) => value.swap_bytes(),
                    _ => value,
                };
                // Peripheral shifts the low byte out first
                wire.extend_from_slice(&value.to_le_bytes()[..size]);
                cursor += size;
            }
            if !desc.links_next() {
                break;
            }
        }
    }
}

impl TransferEngine for MockEngine {
    fn configure(&mut self, config: &StreamConfig) -> TransferResult<()> {
        let mut s = lock(&self.state);
        s.channel = config.channel;
        s.configure_count += 1;
        Ok(())
    }

    fn start(
        &mut self,
        chain: &[TransferDescriptor],
        request: RequestSignal,
    ) -> TransferResult<()> {
        let mut s = lock(&self.state);
        if s.configure_count == 0 {
            return Err(TransferError::NotConfigured);
        }
        if s.busy {
            s.start_while_busy += 1;
            return Err(TransferError::Busy);
        }
        s.start_count += 1;
        s.busy = true;
        s.last_chain = chain.to_vec();
        s.last_request = request;
        Self::execute(chain, &mut s.wire);
        Ok(())
    }

    fn stop(&mut self) {
        let mut s = lock(&self.state);
        s.stop_count += 1;
        if !s.stuck {
            s.busy = false;
        }
    }

    fn busy(&self) -> bool {
        lock(&self.state).busy
    }
}

/// Interrupt flag register of a [`MockEngine`]
#[derive(Debug, Clone)]
pub struct MockInterrupt {
    state: Arc<Mutex<EngineState>>,
}

impl MockInterrupt {
    /// Standalone interrupt with `status` pending
    pub fn with_pending(status: TransferStatus) -> Self {
        let state = EngineState {
            pending: status,
            ..EngineState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn clear_count(&self) -> usize {
        lock(&self.state).clear_count
    }
}

impl TransferInterrupt for MockInterrupt {
    fn pending(&self) -> TransferStatus {
        lock(&self.state).pending
    }

    fn clear(&mut self, status: TransferStatus) {
        let mut s = lock(&self.state);
        s.clear_count += 1;
        s.pending = TransferStatus::from_raw(s.pending.to_raw() & !status.to_raw());
    }
}

// =============================================================================
// Mock Radio
// =============================================================================

#[derive(Default)]
struct RadioState {
    sent: Vec<(SendToken, Vec<u8>)>,
    reject_next: bool,
    handler: Option<&'static dyn ReceiveHandler>,
}

/// Radio link that records frames and delivers injected inbound frames
#[derive(Clone, Default)]
pub struct MockRadio {
    state: Arc<Mutex<RadioState>>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `send`
    pub fn reject_next(&self) {
        lock(&self.state).reject_next = true;
    }

    /// Frames accepted so far
    pub fn sent(&self) -> Vec<(SendToken, Vec<u8>)> {
        lock(&self.state).sent.clone()
    }

    /// Hand an inbound frame to the registered handler
    pub fn deliver(&self, payload: &[u8]) -> bool {
        let handler = lock(&self.state).handler;
        match handler {
            Some(h) => {
                h.on_frame(payload);
                true
            }
            None => false,
        }
    }
}

impl RadioLink for MockRadio {
    fn send(&mut self, frame: &[u8], token: SendToken) -> IoResult<()> {
        let mut s = lock(&self.state);
        if core::mem::take(&mut s.reject_next) {
            return Err(IoError::LinkError);
        }
        s.sent.push((token, frame.to_vec()));
        Ok(())
    }

    fn register_receive(&mut self, handler: &'static dyn ReceiveHandler) {
        lock(&self.state).handler = Some(handler);
    }
}

// =============================================================================
// Mock Pin
// =============================================================================

/// Output pin recording its level and number of level changes
#[derive(Debug, Default)]
pub struct MockPin {
    high: bool,
    transitions: usize,
}

impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn transitions(&self) -> usize {
        self.transitions
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            self.transitions += 1;
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.transitions += 1;
        }
        self.high = true;
        Ok(())
    }
}

// =============================================================================
// Counting Waker
// =============================================================================

/// Waker that counts how often it was woken
#[cfg(feature = "async")]
#[derive(Clone)]
pub struct CountingWaker {
    inner: Arc<WakeCount>,
}

#[cfg(feature = "async")]
struct WakeCount(core::sync::atomic::AtomicUsize);

#[cfg(feature = "async")]
impl std::task::Wake for WakeCount {
    fn wake(self: Arc<Self>) {
        self.0.fetch_add(1, core::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(feature = "async")]
impl CountingWaker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(WakeCount(core::sync::atomic::AtomicUsize::new(0))),
        }
    }

    pub fn waker(&self) -> core::task::Waker {
        core::task::Waker::from(Arc::clone(&self.inner))
    }

    pub fn count(&self) -> usize {
        self.inner.0.load(core::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ChainParams, build_chain};

    #[test]
    fn mock_delay_tracking() {
        let mut delay = MockDelay::new();

        delay.delay_ns(1000);
        delay.delay_us(2);
        assert_eq!(delay.total_ns(), 3000);
        assert_eq!(delay.total_ms(), 0);

        delay.delay_ms(1);
        assert_eq!(delay.total_ms(), 1);
    }

    #[test]
    fn engine_follows_relative_chain() {
        let data: Vec<u8> = (0u8..20).collect();
        let params = ChainParams::new(0).with_max_units(3);
        let chain = build_chain::<4>(data.as_ptr() as usize, 20, &params).unwrap();

        let mut engine = MockEngine::new();
        engine.configure(&StreamConfig::new(0)).unwrap();
        engine.start(chain.as_slice(), RequestSignal(5)).unwrap();

        assert_eq!(engine.wire(), data);
        assert_eq!(engine.last_chain().len(), 4);
        assert_eq!(engine.last_request(), RequestSignal(5));
        assert!(engine.busy());
    }

    #[test]
    fn engine_refuses_start_while_busy() {
        let data = [1u8, 2];
        let chain = build_chain::<1>(data.as_ptr() as usize, 2, &ChainParams::new(0)).unwrap();

        let mut engine = MockEngine::new();
        engine.configure(&StreamConfig::new(0)).unwrap();
        engine.start(chain.as_slice(), RequestSignal(0)).unwrap();
        assert_eq!(
            engine.start(chain.as_slice(), RequestSignal(0)),
            Err(TransferError::Busy)
        );
        assert_eq!(engine.start_while_busy(), 1);

        engine.complete();
        assert!(engine.interrupt().pending().any());
    }

    #[test]
    fn engine_swaps_half_words() {
        let token: [u16; 1] = [0xDEAD];
        let params = ChainParams::new(0).with_byte_swap(true);
        let chain = build_chain::<1>(token.as_ptr() as usize, 2, &params).unwrap();

        let mut engine = MockEngine::new();
        engine.configure(&StreamConfig::new(0)).unwrap();
        engine.start(chain.as_slice(), RequestSignal(0)).unwrap();
        assert_eq!(engine.wire(), [0xDE, 0xAD]);
    }

    #[test]
    fn pin_counts_transitions() {
        let mut pin = MockPin::new();
        pin.set_high().unwrap();
        pin.set_high().unwrap();
        pin.set_low().unwrap();
        assert!(!pin.is_high());
        assert_eq!(pin.transitions(), 2);
    }
}
