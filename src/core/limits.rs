/*!
 * Watchdog Limits and Constants
 *
 * Centralized location for the hard limits and tuning constants of the watchdog.
 * Configurable values live in `config`; everything here is fixed.
 */

use std::time::Duration;

// =============================================================================
// INTERVAL STORAGE
// =============================================================================

/// Hard ceiling on tracked completed intervals
/// Oldest completed interval is dropped beyond this
pub const MAX_INTERVAL_COUNT: usize = 100;

// =============================================================================
// HEARTBEAT
// =============================================================================

/// Monitor tick gap (60s) after which the process is assumed frozen/cached
/// Timestamps are re-baselined instead of reporting a blockage
pub const MONITOR_THREAD_TIMEOUT_MS: u64 = 60_000;

/// Floor applied to the tick period; a zero interval would reschedule forever at once
pub const MIN_SAMPLING_INTERVAL_MS: u64 = 1;

/// A new sample requires more than interval / SAMPLE_BACKOFF_DIVISOR since the last tick
pub const SAMPLE_BACKOFF_DIVISOR: u64 = 2;

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Delay before monitoring stops when capture began in the background
/// Covers slow cold starts that reach the foreground late
pub const BACKGROUND_STOP_DELAY: Duration = Duration::from_secs(10);

// =============================================================================
// CONFIG DEFAULTS
// =============================================================================

pub const DEFAULT_MIN_DURATION_THRESHOLD_MS: u64 = 1000;
pub const DEFAULT_SAMPLING_INTERVAL_MS: u64 = 100;
pub const DEFAULT_MAX_INTERVALS_PER_SESSION: usize = 5;
pub const DEFAULT_MAX_SAMPLES_PER_INTERVAL: usize = 80;
pub const DEFAULT_STACKTRACE_FRAME_LIMIT: usize = 200;

// =============================================================================
// WORKER
// =============================================================================

/// Name of the dedicated watchdog worker thread
pub const WORKER_THREAD_NAME: &str = "blockage-watchdog";

/// Grace period granted to in-flight jobs on worker shutdown
pub const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);
