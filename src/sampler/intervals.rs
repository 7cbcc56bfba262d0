/*!
 * Interval Set
 *
 * One immutable generation of tracked blockage intervals. Transitions never
 * mutate `self`; they build the next generation, sharing every untouched
 * interval through its `Arc`.
 *
 * Invariants held by every generation:
 * - intervals are ordered by start time
 * - at most one interval is open, and it is always the last one
 * - at most `MAX_INTERVAL_COUNT` completed intervals are tracked
 * - completed intervals keeping samples are the longest ones, capped by the
 *   configured maximum
 *
 * Readers see a ranked view in which the open interval also counts toward
 * that maximum: it always keeps its samples, and the shortest completed
 * interval is shown without them. The completed interval is only hidden, so
 * it regains its samples if the open one ends up shorter.
 */

use super::types::{BlockageInterval, Sample};
use crate::core::limits::MAX_INTERVAL_COUNT;
use crate::core::types::TimestampMs;
use std::ops::Deref;
use std::sync::Arc;

/// Why a transition was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    /// Event does not fit the current interval state
    Unbalanced(&'static str),
    /// Timestamp earlier than already observed
    Implausible(&'static str),
}

/// Bookkeeping produced by limit enforcement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Eviction {
    /// Intervals whose samples were cleared
    pub cleared: usize,
    /// Oldest completed intervals dropped entirely
    pub evicted: usize,
}

/// Successful transition
#[derive(Debug)]
pub(crate) struct Applied {
    pub set: IntervalSet,
    pub eviction: Eviction,
    /// A stale open interval was closed to keep the sequence balanced
    pub recovered: bool,
}

#[derive(Debug, Clone, Default)]
pub struct IntervalSet {
    generation: u64,
    /// Stored intervals; transitions work on these
    intervals: Vec<Arc<BlockageInterval>>,
    /// Published view with the open interval counted toward the sampled limit
    view: Vec<Arc<BlockageInterval>>,
}

impl Deref for IntervalSet {
    type Target = [Arc<BlockageInterval>];

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl IntervalSet {
    /// Monotonically increasing publication number
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn open_interval(&self) -> Option<&BlockageInterval> {
        self.intervals
            .last()
            .filter(|interval| interval.is_open())
            .map(Arc::as_ref)
    }

    pub fn completed_count(&self) -> usize {
        self.view.iter().filter(|i| !i.is_open()).count()
    }

    /// Intervals (open included) holding samples in this view
    pub fn sampled_count(&self) -> usize {
        self.view.iter().filter(|i| i.has_samples()).count()
    }

    /// Owned copies of every interval in this view
    pub fn to_vec(&self) -> Vec<BlockageInterval> {
        self.view.iter().map(|i| (**i).clone()).collect()
    }

    fn successor(&self, intervals: Vec<Arc<BlockageInterval>>, max_sampled: usize) -> Self {
        Self {
            generation: self.generation + 1,
            view: ranked_view(&intervals, max_sampled),
            intervals,
        }
    }

    /// Open a new interval at `start`
    ///
    /// A still-open interval is closed at its last evidence of life first.
    pub(crate) fn blocked(&self, start: TimestampMs, max_sampled: usize) -> Result<Applied, Rejection> {
        if let Some(prev) = self.intervals.last() {
            if start < prev.latest_time() {
                return Err(Rejection::Implausible("blockage starts before previous interval ended"));
            }
        }

        let mut intervals = self.intervals.clone();
        let mut eviction = Eviction::default();
        let recovered = match self.open_interval() {
            Some(stale) => {
                let end = stale.latest_time();
                if let Some(last) = intervals.last_mut() {
                    *last = Arc::new(close(stale, end));
                }
                eviction = enforce_limits(&mut intervals, max_sampled);
                true
            }
            None => false,
        };

        intervals.push(Arc::new(BlockageInterval::open(start)));
        Ok(Applied {
            set: self.successor(intervals, max_sampled),
            eviction,
            recovered,
        })
    }

    /// Open interval that may receive evidence at `timestamp`
    pub(crate) fn sample_target(&self, timestamp: TimestampMs) -> Result<&BlockageInterval, Rejection> {
        let open = self
            .open_interval()
            .ok_or(Rejection::Unbalanced("sample without an open interval"))?;
        if timestamp < open.latest_time() {
            return Err(Rejection::Implausible("sample earlier than last known time"));
        }
        Ok(open)
    }

    /// Refresh the open interval's last known time, appending `sample` if any
    ///
    /// Callers validate with [`sample_target`](Self::sample_target) first.
    pub(crate) fn with_evidence(
        &self,
        timestamp: TimestampMs,
        sample: Option<Sample>,
        max_sampled: usize,
    ) -> Self {
        let mut intervals = self.intervals.clone();
        if let Some(last) = intervals.last_mut().filter(|i| i.is_open()) {
            let mut next = (**last).clone();
            next.last_known_time = Some(timestamp);
            if let (Some(samples), Some(sample)) = (next.samples.as_mut(), sample) {
                samples.push(sample);
            }
            *last = Arc::new(next);
        }
        self.successor(intervals, max_sampled)
    }

    /// Close the open interval at `end` and re-rank
    pub(crate) fn unblocked(&self, end: TimestampMs, max_sampled: usize) -> Result<Applied, Rejection> {
        let open = self
            .open_interval()
            .ok_or(Rejection::Unbalanced("unblocked without an open interval"))?;
        if end < open.start_time {
            return Err(Rejection::Implausible("blockage ends before it started"));
        }

        let mut intervals = self.intervals.clone();
        if let Some(last) = intervals.last_mut() {
            *last = Arc::new(close(open, end));
        }
        let eviction = enforce_limits(&mut intervals, max_sampled);

        Ok(Applied {
            set: self.successor(intervals, max_sampled),
            eviction,
            recovered: false,
        })
    }

    /// Drop completed intervals, keeping the open one; `None` if nothing to prune
    pub(crate) fn pruned(&self, max_sampled: usize) -> Option<Self> {
        if self.completed_count() == 0 {
            return None;
        }
        let intervals = self
            .intervals
            .iter()
            .filter(|i| i.is_open())
            .cloned()
            .collect();
        Some(self.successor(intervals, max_sampled))
    }
}

fn close(open: &BlockageInterval, end: TimestampMs) -> BlockageInterval {
    let mut closed = open.clone();
    closed.end_time = Some(end);
    closed.last_known_time = None;
    if let Some(samples) = closed.samples.as_mut() {
        samples.retain(|sample| sample.timestamp <= end);
    }
    closed
}

/// Apply the hard ceiling, then clear samples outside the top `max_sampled`
///
/// Equal durations clear the newer interval, so earlier ones keep samples.
fn enforce_limits(intervals: &mut Vec<Arc<BlockageInterval>>, max_sampled: usize) -> Eviction {
    let mut eviction = Eviction::default();

    while intervals.iter().filter(|i| !i.is_open()).count() > MAX_INTERVAL_COUNT {
        match intervals.iter().position(|i| !i.is_open()) {
            Some(oldest) => {
                intervals.remove(oldest);
                eviction.evicted += 1;
            }
            None => break,
        }
    }

    loop {
        let holders = intervals
            .iter()
            .filter(|i| !i.is_open() && i.has_samples())
            .count();
        if holders <= max_sampled {
            break;
        }

        match least_valuable(intervals) {
            Some(idx) => {
                intervals[idx] = Arc::new(intervals[idx].cleared());
                eviction.cleared += 1;
            }
            None => break,
        }
    }

    eviction
}

/// Completed interval with samples and the shortest duration
///
/// Equal durations pick the newer interval, so earlier ones keep samples.
fn least_valuable(intervals: &[Arc<BlockageInterval>]) -> Option<usize> {
    intervals
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, i)| !i.is_open() && i.has_samples())
        .min_by_key(|(_, i)| i.duration().unwrap_or(0))
        .map(|(idx, _)| idx)
}

/// Reader view: the open interval takes one of the sampled slots
fn ranked_view(intervals: &[Arc<BlockageInterval>], max_sampled: usize) -> Vec<Arc<BlockageInterval>> {
    let mut view = intervals.to_vec();
    if !intervals.last().is_some_and(|i| i.is_open()) {
        return view;
    }

    while view.iter().filter(|i| i.has_samples()).count() > max_sampled {
        match least_valuable(&view) {
            Some(idx) => view[idx] = Arc::new(view[idx].cleared()),
            None => break,
        }
    }
    view
}
