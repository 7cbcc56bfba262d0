/*!
 * Sampler Types
 * Immutable records shared with snapshot readers
 */

use crate::core::types::TimestampMs;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Interval status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntervalCode {
    #[default]
    Default,
    /// Samples were evicted; timing is still valid
    SamplesCleared,
}

impl IntervalCode {
    /// Numeric code used on the wire
    #[inline]
    pub const fn as_code(self) -> u8 {
        match self {
            Self::Default => 0,
            Self::SamplesCleared => 1,
        }
    }
}

/// Sample status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SampleCode {
    #[default]
    Default,
    /// Counted for timing, stored without a thread snapshot
    SampleLimitReached,
}

impl SampleCode {
    #[inline]
    pub const fn as_code(self) -> u8 {
        match self {
            Self::Default => 0,
            Self::SampleLimitReached => 1,
        }
    }
}

/// Scheduling state of the sampled thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadState {
    Runnable,
    Blocked,
    Waiting,
    TimedWaiting,
    #[default]
    Unknown,
}

impl ThreadState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Runnable => "RUNNABLE",
            Self::Blocked => "BLOCKED",
            Self::Waiting => "WAITING",
            Self::TimedWaiting => "TIMED_WAITING",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Stack of the target thread at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    pub thread_id: u64,
    pub name: String,
    pub state: ThreadState,
    pub priority: i32,
    /// Innermost frame first, truncated to the frame limit
    pub lines: Vec<String>,
    /// Depth before truncation
    pub frame_count: usize,
}

impl ThreadSnapshot {
    /// Stack rendered one frame per line
    pub fn stack_text(&self) -> String {
        self.lines.join("\n")
    }
}

/// One capture during a blockage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: TimestampMs,
    pub overhead_ms: u64,
    pub code: SampleCode,
    pub thread: Option<Arc<ThreadSnapshot>>,
}

impl Sample {
    /// Placeholder recorded once the per-interval cap is reached
    pub fn limit_reached(timestamp: TimestampMs) -> Self {
        Self {
            timestamp,
            overhead_ms: 0,
            code: SampleCode::SampleLimitReached,
            thread: None,
        }
    }
}

/// One continuous period in which the target thread did not respond
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockageInterval {
    pub start_time: TimestampMs,
    pub end_time: Option<TimestampMs>,
    pub last_known_time: Option<TimestampMs>,
    pub code: IntervalCode,
    /// `None` only when `code` is [`IntervalCode::SamplesCleared`]
    pub samples: Option<Vec<Sample>>,
}

impl BlockageInterval {
    pub(crate) fn open(start_time: TimestampMs) -> Self {
        Self {
            start_time,
            end_time: None,
            last_known_time: Some(start_time),
            code: IntervalCode::Default,
            samples: Some(Vec::new()),
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    #[inline]
    pub fn has_samples(&self) -> bool {
        self.samples.is_some()
    }

    /// Duration of a completed interval
    pub fn duration(&self) -> Option<u64> {
        self.end_time.map(|end| end.saturating_sub(self.start_time))
    }

    pub fn sample_count(&self) -> usize {
        self.samples.as_ref().map_or(0, Vec::len)
    }

    /// Most recent evidence of life: end time once closed
    pub fn latest_time(&self) -> TimestampMs {
        self.end_time
            .or(self.last_known_time)
            .unwrap_or(self.start_time)
    }

    pub(crate) fn cleared(&self) -> Self {
        Self {
            start_time: self.start_time,
            end_time: self.end_time,
            last_known_time: self.last_known_time,
            code: IntervalCode::SamplesCleared,
            samples: None,
        }
    }
}
