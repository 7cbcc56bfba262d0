/*!
 * Span Export
 *
 * Maps each interval onto a trace span and each of its samples onto a span
 * event. Times are unix nanoseconds; an open interval ends at `now`.
 */

use super::deduplicated;
use crate::core::types::{millis_to_nanos, TimestampMs};
use crate::sampler::{BlockageInterval, Sample, ThreadSnapshot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const BLOCKAGE_SPAN_NAME: &str = "emb-thread-blockage";
pub const BLOCKAGE_SAMPLE_EVENT_NAME: &str = "perf.thread_blockage_sample";

const BLOCKAGE_SPAN_TYPE: &str = "perf.thread_blockage";
const ROOT_PARENT_SPAN_ID: &str = "0000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    fn new(key: &str, value: impl ToString) -> Self {
        Self {
            key: key.to_owned(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEvent {
    pub name: String,
    pub timestamp_unix_nano: u64,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRecord {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: String,
    pub name: String,
    pub start_time_unix_nano: u64,
    pub end_time_unix_nano: u64,
    pub attributes: Vec<Attribute>,
    pub events: Vec<SpanEvent>,
}

impl SpanRecord {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        find(&self.attributes, key)
    }
}

impl SpanEvent {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        find(&self.attributes, key)
    }
}

fn find<'a>(attributes: &'a [Attribute], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|attr| attr.key == key)
        .map(|attr| attr.value.as_str())
}

/// Build the span for one interval
pub fn map_interval_to_span(interval: &BlockageInterval, now: TimestampMs) -> SpanRecord {
    let trace_id = Uuid::new_v4().simple().to_string();
    let span_id = Uuid::new_v4().simple().to_string()[..16].to_owned();
    let end = interval.end_time.unwrap_or(now);

    let mut attributes = vec![
        Attribute::new("emb.type", BLOCKAGE_SPAN_TYPE),
        Attribute::new("interval_code", interval.code.as_code()),
    ];
    if let Some(last_known) = interval.last_known_time {
        attributes.push(Attribute::new(
            "last_known_time_unix_nano",
            millis_to_nanos(last_known),
        ));
    }

    let events = interval
        .samples
        .as_deref()
        .map(|samples| {
            deduplicated(samples)
                .map(|(sample, thread)| map_sample_to_event(sample, thread))
                .collect()
        })
        .unwrap_or_default();

    SpanRecord {
        trace_id,
        span_id,
        parent_span_id: ROOT_PARENT_SPAN_ID.to_owned(),
        name: BLOCKAGE_SPAN_NAME.to_owned(),
        start_time_unix_nano: millis_to_nanos(interval.start_time),
        end_time_unix_nano: millis_to_nanos(end),
        attributes,
        events,
    }
}

/// `thread` is `None` past the sample limit or when the stack repeats
fn map_sample_to_event(sample: &Sample, thread: Option<&ThreadSnapshot>) -> SpanEvent {
    let mut attributes = vec![
        Attribute::new("emb.type", BLOCKAGE_SAMPLE_EVENT_NAME),
        Attribute::new("sample_overhead", millis_to_nanos(sample.overhead_ms)),
        Attribute::new("sample_code", sample.code.as_code()),
    ];
    if let Some(thread) = thread {
        attributes.extend([
            Attribute::new("thread_name", &thread.name),
            Attribute::new("thread_state", thread.state.as_str()),
            Attribute::new("thread_priority", thread.priority),
            Attribute::new("exception.stacktrace", thread.stack_text()),
            Attribute::new("frame_count", thread.frame_count),
        ]);
    }

    SpanEvent {
        name: BLOCKAGE_SAMPLE_EVENT_NAME.to_owned(),
        timestamp_unix_nano: millis_to_nanos(sample.timestamp),
        attributes,
    }
}
