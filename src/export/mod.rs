/*!
 * Export
 *
 * The only shapes in which captured blockage data leaves the watchdog:
 * flat [`IntervalRecord`]s and span-shaped [`SpanRecord`]s. Serialization
 * and delivery belong to the caller.
 */

mod record;
mod span;

use crate::sampler::{Sample, ThreadSnapshot};

pub use record::{IntervalRecord, SampleRecord};
pub use span::{
    map_interval_to_span, Attribute, SpanEvent, SpanRecord, BLOCKAGE_SAMPLE_EVENT_NAME,
    BLOCKAGE_SPAN_NAME,
};

/// Pair each sample with its thread snapshot, or `None` when the snapshot
/// repeats the previous sample's
///
/// Timing, overhead and code are always kept; only the stack is omitted.
pub(crate) fn deduplicated<'a>(
    samples: &'a [Sample],
) -> impl Iterator<Item = (&'a Sample, Option<&'a ThreadSnapshot>)> + 'a {
    let mut previous: Option<&ThreadSnapshot> = None;
    samples.iter().map(move |sample| {
        let current = sample.thread.as_deref();
        let repeated = current.is_some() && current == previous;
        previous = current;
        (sample, if repeated { None } else { current })
    })
}
