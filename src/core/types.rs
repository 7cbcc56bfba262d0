/*!
 * Core Types
 * Common types used across the watchdog
 */

use std::sync::Arc;

/// Timestamp in milliseconds (UNIX epoch for [`SystemClock`](super::SystemClock))
pub type TimestampMs = u64;

/// Unit of work executed on the watchdog worker or the target run-loop
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Callback invoked with the time at which the target run-loop drained a probe
pub type AckCallback = Arc<dyn Fn(TimestampMs) + Send + Sync>;

/// Common result type for watchdog operations
pub type WatchdogResult<T> = Result<T, super::errors::WatchdogError>;

/// Convert milliseconds to nanoseconds for export
#[inline]
pub const fn millis_to_nanos(ms: TimestampMs) -> u64 {
    ms.saturating_mul(1_000_000)
}
