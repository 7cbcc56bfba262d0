/*!
 * Heartbeat
 *
 * Periodically probes the target run-loop from the watchdog worker and turns
 * missing acknowledgments into blockage transition events.
 */

mod detector;
mod scheduler;
mod source;
mod state;

pub use detector::BlockedThreadDetector;
pub use scheduler::HeartbeatScheduler;
pub use source::{HeartbeatSource, RunLoop, RunLoopHeartbeat};
pub use state::MonitoringState;

use crate::core::types::TimestampMs;
use serde::{Deserialize, Serialize};

/// Transition emitted by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockageEvent {
    /// Threshold exceeded; carries the last acknowledgment time
    Blocked,
    /// Still blocked; take a sample
    BlockedInterval,
    /// Target thread acknowledged again
    Unblocked,
}

/// Receives blockage transitions on the watchdog worker thread
pub trait BlockageListener: Send + Sync {
    fn on_blockage_event(&self, event: BlockageEvent, timestamp: TimestampMs);
}
