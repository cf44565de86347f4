//! Shared pipeline state.
//!
//! The only cross-task mutable data besides the slots: the last sequence
//! number accepted and the per-period counters. Everything sits behind one
//! critical-section cell; the roles write, the reporter takes and resets.

use crate::sync::CriticalSectionCell;

/// Counters for one report period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineStats {
    /// Payload bytes moved
    pub bytes: u32,
    /// Frames handed off or forwarded
    pub frames: u32,
    /// A sequence gap or implausible content was seen
    pub loss: bool,
    /// Frames missing according to sequence gaps
    pub lost_frames: u32,
    /// Slot tokens not acquired in time
    pub contention: u32,
    /// Generator found the next slot still busy
    pub overruns: u32,
    /// Completion signals that never arrived
    pub timeouts: u32,
    /// Sends the link or engine refused or failed
    pub link_errors: u32,
    /// Inbound frames dropped because the stream was busy
    pub busy_drops: u32,
}

impl PipelineStats {
    /// Nothing went wrong during the period
    pub fn is_clean(&self) -> bool {
        !self.loss
            && self.contention == 0
            && self.overruns == 0
            && self.timeouts == 0
            && self.link_errors == 0
            && self.busy_drops == 0
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Inner {
    last_sequence: Option<u32>,
    stats: PipelineStats,
}

/// Process-wide pipeline state
pub struct PipelineState {
    inner: CriticalSectionCell<Inner>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    /// Empty state
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(Inner {
                last_sequence: None,
                stats: PipelineStats {
                    bytes: 0,
                    frames: 0,
                    loss: false,
                    lost_frames: 0,
                    contention: 0,
                    overruns: 0,
                    timeouts: 0,
                    link_errors: 0,
                    busy_drops: 0,
                },
            }),
        }
    }

    /// Sequence number of the last frame handed off or accepted
    pub fn last_sequence(&self) -> Option<u32> {
        self.inner.with_ref(|s| s.last_sequence)
    }

    /// A complete frame carrying `seq` with `bytes` of payload
    pub fn record_frame(&self, seq: u32, bytes: usize) {
        self.inner.with(|s| {
            s.last_sequence = Some(seq);
            s.stats.frames = s.stats.frames.wrapping_add(1);
            s.stats.bytes = s.stats.bytes.wrapping_add(bytes as u32);
        });
    }

    /// `missing` frames went missing
    pub fn record_loss(&self, missing: u32) {
        self.inner.with(|s| {
            s.stats.loss = true;
            s.stats.lost_frames = s.stats.lost_frames.saturating_add(missing);
        });
    }

    /// Frame content failed the plausibility check
    pub fn record_suspect_content(&self) {
        self.inner.with(|s| s.stats.loss = true);
    }

    /// A slot token was not acquired in time
    pub fn record_contention(&self) {
        self.inner.with(|s| s.stats.contention = s.stats.contention.saturating_add(1));
    }

    /// The generator overran the sender
    pub fn record_overrun(&self) {
        self.inner.with(|s| s.stats.overruns = s.stats.overruns.saturating_add(1));
    }

    /// A completion wait expired
    pub fn record_timeout(&self) {
        self.inner.with(|s| s.stats.timeouts = s.stats.timeouts.saturating_add(1));
    }

    /// A send was refused or failed
    pub fn record_link_error(&self) {
        self.inner.with(|s| s.stats.link_errors = s.stats.link_errors.saturating_add(1));
    }

    /// An inbound frame was dropped because the stream was busy
    pub fn record_busy_drop(&self) {
        self.inner.with(|s| s.stats.busy_drops = s.stats.busy_drops.saturating_add(1));
    }

    /// Counters so far, without resetting
    pub fn stats(&self) -> PipelineStats {
        self.inner.with_ref(|s| s.stats)
    }

    /// Counters of the elapsed period; starts a new one.
    pub fn take_report(&self) -> PipelineStats {
        self.inner.with(|s| core::mem::take(&mut s.stats))
    }
}
