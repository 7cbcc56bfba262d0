/*!
 * Clock
 * Millisecond time source, swappable for deterministic tests
 */

use super::types::TimestampMs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Millisecond time source
pub trait Clock: Send + Sync {
    fn now(&self) -> TimestampMs;
}

/// Epoch milliseconds that advance monotonically
///
/// The wall clock is read once at construction; afterwards time advances by
/// `Instant`, so wall-clock jumps never show up as gaps between heartbeats.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    anchor: Instant,
    anchor_epoch_ms: TimestampMs,
}

impl SystemClock {
    pub fn new() -> Self {
        let anchor_epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO) // Fallback for broken clocks
            .as_millis() as TimestampMs;
        Self {
            anchor: Instant::now(),
            anchor_epoch_ms,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> TimestampMs {
        let elapsed = self.anchor.elapsed().as_millis() as TimestampMs;
        self.anchor_epoch_ms.saturating_add(elapsed)
    }
}

/// Manually driven clock
#[derive(Debug, Default)]
pub struct FakeClock {
    now: AtomicU64,
}

impl FakeClock {
    pub fn new(now: TimestampMs) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: TimestampMs) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Advance the clock, returning the new time
    pub fn tick(&self, ms: u64) -> TimestampMs {
        self.now.fetch_add(ms, Ordering::SeqCst) + ms
    }
}

impl Clock for FakeClock {
    fn now(&self) -> TimestampMs {
        self.now.load(Ordering::SeqCst)
    }
}
