//! Periodic statistics report and heartbeat.

use embedded_hal::delay::DelayNs;

use super::state::{PipelineState, PipelineStats};
use crate::driver::config::PipelineConfig;
use crate::internal::fmt::{log_debug, log_info};

/// Takes and logs the pipeline counters once per period
pub struct Reporter<'s> {
    state: &'s PipelineState,
    interval_ms: u32,
}

impl<'s> Reporter<'s> {
    /// Reporter using the configured report interval
    pub fn new(state: &'s PipelineState, config: &PipelineConfig) -> Self {
        Self {
            state,
            interval_ms: config.report_interval_ms,
        }
    }

    /// Close the current period and log it.
    pub fn report(&self) -> PipelineStats {
        let stats = self.state.take_report();
        if stats.loss {
            log_info!(
                "Data lost! during {} ms - {} bytes received, {} frames missing",
                self.interval_ms, stats.bytes, stats.lost_frames
            );
        } else {
            log_info!("no loss during {} ms - {} bytes received", self.interval_ms, stats.bytes);
        }
        if !stats.is_clean() {
            log_debug!(
                "contention {} overruns {} timeouts {} link errors {} busy drops {}",
                stats.contention, stats.overruns, stats.timeouts, stats.link_errors, stats.busy_drops
            );
        }
        stats
    }

    /// Report forever.
    pub fn run<D: DelayNs>(&self, delay: &mut D) -> ! {
        loop {
            delay.delay_ms(self.interval_ms);
            self.report();
        }
    }
}

/// Periodic liveness log
pub struct Heartbeat {
    interval_ms: u32,
    beats: u32,
}

impl Heartbeat {
    /// Heartbeat using the configured interval
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            interval_ms: config.heartbeat_interval_ms,
            beats: 0,
        }
    }

    /// Log one beat; returns the beat count.
    pub fn beat(&mut self) -> u32 {
        self.beats = self.beats.wrapping_add(1);
        log_info!("heartbeat {}", self.beats);
        self.beats
    }

    /// Beat forever.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        loop {
            delay.delay_ms(self.interval_ms);
            self.beat();
        }
    }
}
