/*!
 * Sampler Property Tests
 * Invariants over arbitrary event sequences
 */

use crate::common::{sampler_with, T0};
use blockage_watchdog::core::limits::MAX_INTERVAL_COUNT;
use blockage_watchdog::{BlockageEvent, Clock, IntervalSet, SampleCode, WatchdogConfig};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Event(BlockageEvent, u64),
    /// Event stamped earlier than the clock
    Stale(BlockageEvent, u64),
    SessionChange,
}

fn event() -> impl Strategy<Value = BlockageEvent> {
    prop_oneof![
        1 => Just(BlockageEvent::Blocked),
        3 => Just(BlockageEvent::BlockedInterval),
        1 => Just(BlockageEvent::Unblocked),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        10 => (event(), 0u64..3_000).prop_map(|(e, d)| Step::Event(e, d)),
        1 => (event(), 1u64..500).prop_map(|(e, d)| Step::Stale(e, d)),
        1 => Just(Step::SessionChange),
    ]
}

fn check_invariants(set: &IntervalSet, config: &WatchdogConfig, no_evictions: bool) {
    assert!(set.completed_count() <= MAX_INTERVAL_COUNT);

    // Only the last interval may be open; start times ascend
    assert!(set.iter().rev().skip(1).all(|i| !i.is_open()));
    assert!(set.windows(2).all(|w| w[0].start_time <= w[1].start_time));

    let holders: Vec<u64> = set
        .iter()
        .filter(|i| !i.is_open() && i.has_samples())
        .filter_map(|i| i.duration())
        .collect();
    let cleared: Vec<u64> = set
        .iter()
        .filter(|i| !i.has_samples())
        .filter_map(|i| i.duration())
        .collect();
    // The open interval takes one of the sampled slots but is never cleared
    let open = usize::from(set.open_interval().is_some());
    assert!(set.sampled_count() <= config.max_intervals_per_session.max(open));
    if no_evictions {
        assert_eq!(
            holders.len(),
            set.completed_count()
                .min(config.max_intervals_per_session.saturating_sub(open))
        );
        let shortest_kept = holders.iter().min().copied().unwrap_or(u64::MAX);
        assert!(cleared.iter().all(|&d| d <= shortest_kept));
    }

    if let Some(open) = set.open_interval() {
        assert!(open.has_samples());
    }

    for interval in set.iter() {
        let end = interval.end_time.unwrap_or(u64::MAX);
        for (index, sample) in interval.samples.iter().flatten().enumerate() {
            assert!(sample.timestamp >= interval.start_time && sample.timestamp <= end);
            if index >= config.max_samples_per_interval {
                assert_eq!(sample.code, SampleCode::SampleLimitReached);
                assert!(sample.thread.is_none());
            } else {
                assert_eq!(sample.code, SampleCode::Default);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_sampler_invariants_hold(
        steps in prop::collection::vec(step(), 1..250),
        max_intervals in 0usize..6,
        max_samples in 0usize..8,
    ) {
        let config = WatchdogConfig {
            max_intervals_per_session: max_intervals,
            max_samples_per_interval: max_samples,
            ..WatchdogConfig::default()
        };
        let (clock, sampler) = sampler_with(config.clone());
        let mut last_generation = 0;

        for step in steps {
            let before = sampler.snapshot();
            let frozen = before.to_vec();

            match step {
                Step::Event(event, delta) => {
                    let now = clock.tick(delta);
                    sampler.on_event(event, now);
                }
                Step::Stale(event, back) => {
                    sampler.on_event(event, clock.now().saturating_sub(back).max(T0));
                }
                Step::SessionChange => sampler.on_post_session_change(),
            }

            let after = sampler.snapshot();
            prop_assert!(after.generation() >= last_generation);
            last_generation = after.generation();
            // Earlier snapshot never changes
            prop_assert_eq!(before.to_vec(), frozen);

            let no_evictions = sampler.stats().intervals_evicted == 0;
            check_invariants(&after, &config, no_evictions);
        }
    }

    #[test]
    fn prop_ceiling_never_exceeded(count in 95usize..140) {
        let (clock, sampler) = sampler_with(WatchdogConfig::default());
        for _ in 0..count {
            sampler.on_event(BlockageEvent::Blocked, clock.now());
            let now = clock.tick(10);
            sampler.on_event(BlockageEvent::Unblocked, now);
        }
        let snapshot = sampler.snapshot();
        prop_assert_eq!(snapshot.len(), count.min(MAX_INTERVAL_COUNT));
        prop_assert_eq!(
            sampler.stats().intervals_evicted as usize,
            count.saturating_sub(MAX_INTERVAL_COUNT)
        );
    }
}
