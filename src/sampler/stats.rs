/*!
 * Sampler Statistics
 * Relaxed atomic counters, readable from any thread
 */

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`SamplerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SamplerStatsSnapshot {
    pub intervals_recorded: u64,
    pub samples_captured: u64,
    pub samples_over_limit: u64,
    pub intervals_cleared: u64,
    pub intervals_evicted: u64,
    pub anomalies_ignored: u64,
}

/// Sampler counters
///
/// Individual values are exact; values read together may be from slightly
/// different moments.
#[derive(Debug, Default)]
pub struct SamplerStats {
    intervals_recorded: AtomicU64,
    samples_captured: AtomicU64,
    samples_over_limit: AtomicU64,
    intervals_cleared: AtomicU64,
    intervals_evicted: AtomicU64,
    anomalies_ignored: AtomicU64,
}

impl SamplerStats {
    #[inline(always)]
    pub(crate) fn inc_recorded(&self) {
        self.intervals_recorded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn inc_captured(&self) {
        self.samples_captured.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn inc_over_limit(&self) {
        self.samples_over_limit.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_cleared(&self, count: usize) {
        self.intervals_cleared
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_evicted(&self, count: usize) {
        self.intervals_evicted
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn inc_anomalies(&self) {
        self.anomalies_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SamplerStatsSnapshot {
        SamplerStatsSnapshot {
            intervals_recorded: self.intervals_recorded.load(Ordering::Relaxed),
            samples_captured: self.samples_captured.load(Ordering::Relaxed),
            samples_over_limit: self.samples_over_limit.load(Ordering::Relaxed),
            intervals_cleared: self.intervals_cleared.load(Ordering::Relaxed),
            intervals_evicted: self.intervals_evicted.load(Ordering::Relaxed),
            anomalies_ignored: self.anomalies_ignored.load(Ordering::Relaxed),
        }
    }
}
