/*!
 * Blocked Thread Detector
 *
 * Pure decision logic: given the monitoring state and a timestamp, decide
 * which blockage transition (if any) to emit. All calls happen on the
 * watchdog worker, so the state is passed in by the scheduler that owns it.
 */

use super::{BlockageEvent, BlockageListener, MonitoringState};
use crate::config::WatchdogConfig;
use crate::core::clock::Clock;
use crate::core::limits::{MONITOR_THREAD_TIMEOUT_MS, SAMPLE_BACKOFF_DIVISOR};
use crate::core::types::TimestampMs;
use std::sync::Arc;
use tracing::{debug, info};

pub struct BlockedThreadDetector {
    clock: Arc<dyn Clock>,
    listener: Arc<dyn BlockageListener>,
}

impl BlockedThreadDetector {
    pub fn new(clock: Arc<dyn Clock>, listener: Arc<dyn BlockageListener>) -> Self {
        Self { clock, listener }
    }

    /// The target run-loop drained a probe at `timestamp`
    pub fn on_target_ack(&self, state: &mut MonitoringState, timestamp: TimestampMs) {
        if timestamp < state.last_target_ack {
            debug!(
                timestamp,
                last_ack = state.last_target_ack,
                "Ignoring out-of-order acknowledgment"
            );
            return;
        }
        state.last_target_ack = timestamp;

        if state.blocked {
            state.blocked = false;
            self.listener
                .on_blockage_event(BlockageEvent::Unblocked, timestamp);
        }
    }

    /// Monitoring is stopping; an ongoing blockage ends at the last tick that saw it
    pub fn release(&self, state: &mut MonitoringState) {
        if state.blocked {
            state.blocked = false;
            debug!(end = state.last_monitor_tick, "Closing blockage on stop");
            self.listener
                .on_blockage_event(BlockageEvent::Unblocked, state.last_monitor_tick);
        }
    }

    /// Periodic check from the watchdog worker
    pub fn on_monitor_tick(
        &self,
        state: &mut MonitoringState,
        timestamp: TimestampMs,
        config: &WatchdogConfig,
    ) {
        if timestamp < state.last_monitor_tick {
            debug!(
                timestamp,
                last_tick = state.last_monitor_tick,
                "Ignoring out-of-order monitor tick"
            );
            return;
        }

        if !state.blocked && self.threshold_exceeded(state, timestamp, config) {
            state.blocked = true;
            info!(since = state.last_target_ack, "Target thread blocked");
            self.listener
                .on_blockage_event(BlockageEvent::Blocked, state.last_target_ack);
        }
        if state.blocked && Self::should_sample(state, timestamp, config) {
            self.listener
                .on_blockage_event(BlockageEvent::BlockedInterval, timestamp);
        }
        state.last_monitor_tick = self.clock.now().max(timestamp);
    }

    /// Starved worker ticks arriving in quick succession do not sample again
    fn should_sample(state: &MonitoringState, timestamp: TimestampMs, config: &WatchdogConfig) -> bool {
        let since_last_tick = timestamp.saturating_sub(state.last_monitor_tick);
        since_last_tick.saturating_mul(SAMPLE_BACKOFF_DIVISOR) > config.sampling_interval_ms
    }

    fn threshold_exceeded(
        &self,
        state: &mut MonitoringState,
        timestamp: TimestampMs,
        config: &WatchdogConfig,
    ) -> bool {
        let monitor_lag = timestamp.saturating_sub(state.last_monitor_tick);
        let target_lag = timestamp.saturating_sub(state.last_target_ack);

        // A huge gap between ticks means the whole process was frozen; the
        // clock kept running while nothing could respond.
        if monitor_lag > MONITOR_THREAD_TIMEOUT_MS {
            let now = self.clock.now().max(timestamp);
            debug!(monitor_lag, "Process freeze detected, re-baselining heartbeat");
            state.last_target_ack = now;
            state.last_monitor_tick = now;
            return false;
        }
        target_lag > config.min_duration_threshold_ms
    }
}
