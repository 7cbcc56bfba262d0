/*!
 * Interval Records
 */

use super::deduplicated;
use crate::core::types::TimestampMs;
use crate::sampler::{BlockageInterval, IntervalCode, Sample, SampleCode, ThreadSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub timestamp: TimestampMs,
    pub overhead_ms: u64,
    pub code: SampleCode,
    /// Absent past the sample limit, or when equal to the previous sample's
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_text: Option<String>,
}

impl SampleRecord {
    fn with_thread(sample: &Sample, thread: Option<&ThreadSnapshot>) -> Self {
        Self {
            timestamp: sample.timestamp,
            overhead_ms: sample.overhead_ms,
            code: sample.code,
            stack_text: thread.map(ThreadSnapshot::stack_text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub start_time: TimestampMs,
    pub end_time: Option<TimestampMs>,
    pub last_known_time: Option<TimestampMs>,
    pub code: IntervalCode,
    /// `None` once samples were cleared
    pub samples: Option<Vec<SampleRecord>>,
}

impl From<&Sample> for SampleRecord {
    fn from(sample: &Sample) -> Self {
        Self::with_thread(sample, sample.thread.as_deref())
    }
}

impl From<&BlockageInterval> for IntervalRecord {
    fn from(interval: &BlockageInterval) -> Self {
        Self {
            start_time: interval.start_time,
            end_time: interval.end_time,
            last_known_time: interval.last_known_time,
            code: interval.code,
            samples: interval
                .samples
                .as_ref()
                .map(|samples| {
                    deduplicated(samples)
                        .map(|(sample, thread)| SampleRecord::with_thread(sample, thread))
                        .collect()
                }),
        }
    }
}
