/*!
 * Sampler Engine
 *
 * # Concurrency
 *
 * Single writer (the watchdog worker), any number of readers. The tracked
 * intervals live in one [`RcuCell`]; every event derives a complete new
 * [`IntervalSet`] and swaps it in, so a reader holding a snapshot never sees
 * it change and never observes a half-applied transition.
 */

use super::capture::{truncate_frames, StackSource};
use super::intervals::{Eviction, IntervalSet, Rejection};
use super::stats::{SamplerStats, SamplerStatsSnapshot};
use super::types::{Sample, SampleCode};
use crate::config::{ConfigSource, WatchdogConfig};
use crate::core::clock::Clock;
use crate::core::sync::RcuCell;
use crate::core::types::TimestampMs;
use crate::heartbeat::{BlockageEvent, BlockageListener};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct BlockageSampler {
    clock: Arc<dyn Clock>,
    config: Arc<dyn ConfigSource>,
    stacks: Arc<dyn StackSource>,
    intervals: RcuCell<IntervalSet>,
    stats: SamplerStats,
}

impl BlockageSampler {
    pub fn new(
        clock: Arc<dyn Clock>,
        config: Arc<dyn ConfigSource>,
        stacks: Arc<dyn StackSource>,
    ) -> Self {
        Self {
            clock,
            config,
            stacks,
            intervals: RcuCell::default(),
            stats: SamplerStats::default(),
        }
    }

    /// Apply one transition
    ///
    /// Unbalanced or implausible events are logged and leave state unchanged.
    pub fn on_event(&self, event: BlockageEvent, timestamp: TimestampMs) {
        let config = self.config.current();
        let max_sampled = config.max_intervals_per_session;

        self.intervals.publish(|set| match event {
            BlockageEvent::Blocked => match set.blocked(timestamp, max_sampled) {
                Ok(applied) => {
                    if applied.recovered {
                        warn!(timestamp, "Blockage started while another was open; closed the stale interval");
                    }
                    self.stats.inc_recorded();
                    self.record_eviction(applied.eviction);
                    Some(applied.set)
                }
                Err(rejection) => self.reject(event, timestamp, rejection),
            },
            BlockageEvent::BlockedInterval => {
                let open = match set.sample_target(timestamp) {
                    Ok(open) => open,
                    Err(rejection) => return self.reject(event, timestamp, rejection),
                };
                let sample = if !config.capture_enabled {
                    None
                } else if open.sample_count() >= config.max_samples_per_interval {
                    self.stats.inc_over_limit();
                    Some(Sample::limit_reached(timestamp))
                } else {
                    Some(self.capture(timestamp, &config))
                };
                Some(set.with_evidence(timestamp, sample, max_sampled))
            }
            BlockageEvent::Unblocked => match set.unblocked(timestamp, max_sampled) {
                Ok(applied) => {
                    self.record_eviction(applied.eviction);
                    Some(applied.set)
                }
                Err(rejection) => self.reject(event, timestamp, rejection),
            },
        });
    }

    /// Current generation; never blocks the writer
    pub fn snapshot(&self) -> Arc<IntervalSet> {
        self.intervals.load()
    }

    /// Drop completed intervals at a session boundary, keeping the open one
    pub fn on_post_session_change(&self) {
        let max_sampled = self.config.current().max_intervals_per_session;
        if self.intervals.publish(|set| set.pruned(max_sampled)) {
            debug!("Pruned completed blockage intervals");
        }
    }

    pub fn stats(&self) -> SamplerStatsSnapshot {
        self.stats.snapshot()
    }

    fn capture(&self, timestamp: TimestampMs, config: &WatchdogConfig) -> Sample {
        let started = self.clock.now();
        let thread = self
            .stacks
            .capture()
            .map(|snapshot| Arc::new(truncate_frames(snapshot, config.stacktrace_frame_limit)));
        let overhead_ms = self.clock.now().saturating_sub(started);

        self.stats.inc_captured();
        Sample {
            timestamp,
            overhead_ms,
            code: SampleCode::Default,
            thread,
        }
    }

    fn record_eviction(&self, eviction: Eviction) {
        if eviction.cleared > 0 {
            debug!(cleared = eviction.cleared, "Cleared samples of shorter blockages");
            self.stats.add_cleared(eviction.cleared);
        }
        if eviction.evicted > 0 {
            debug!(evicted = eviction.evicted, "Dropped oldest blockage intervals");
            self.stats.add_evicted(eviction.evicted);
        }
    }

    fn reject(
        &self,
        event: BlockageEvent,
        timestamp: TimestampMs,
        rejection: Rejection,
    ) -> Option<IntervalSet> {
        self.stats.inc_anomalies();
        match rejection {
            Rejection::Unbalanced(reason) => {
                warn!(?event, timestamp, reason, "Unbalanced blockage event ignored")
            }
            Rejection::Implausible(reason) => {
                debug!(?event, timestamp, reason, "Implausible timestamp ignored")
            }
        }
        None
    }
}

impl BlockageListener for BlockageSampler {
    fn on_blockage_event(&self, event: BlockageEvent, timestamp: TimestampMs) {
        self.on_event(event, timestamp);
    }
}
