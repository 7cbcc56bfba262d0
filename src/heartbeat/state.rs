/*!
 * Monitoring State
 */

use crate::core::types::TimestampMs;
use serde::Serialize;

/// Heartbeat bookkeeping, owned by the scheduler and mutated only on the worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitoringState {
    pub started: bool,
    pub last_monitor_tick: TimestampMs,
    pub last_target_ack: TimestampMs,
    pub blocked: bool,
}

impl MonitoringState {
    /// Re-baseline timestamps so the gap before `now` is not read as a blockage
    ///
    /// `started` is left untouched.
    pub fn reset(&mut self, now: TimestampMs) {
        self.last_monitor_tick = now;
        self.last_target_ack = now;
        self.blocked = false;
    }
}
