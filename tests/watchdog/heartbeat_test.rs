/*!
 * Heartbeat Scheduler Tests
 *
 * Driven by a manual worker and fake clock; nothing here sleeps.
 */

use crate::common::{RecordingListener, TargetLoop, T0};
use blockage_watchdog::core::types::AckCallback;
use blockage_watchdog::{
    BlockageEvent, Clock, FakeClock, HeartbeatError, HeartbeatScheduler, HeartbeatSource,
    ManualWorker, RunLoopHeartbeat, SharedConfig,
};
use mockall::mock;
use pretty_assertions::assert_eq;
use std::sync::Arc;

mock! {
    pub Source {}

    impl HeartbeatSource for Source {
        fn post_probe(&self, on_ack: AckCallback) -> Result<(), HeartbeatError>;
    }
}

struct Fixture {
    clock: Arc<FakeClock>,
    worker: Arc<ManualWorker>,
    config: Arc<SharedConfig>,
    target: TargetLoop,
    listener: Arc<RecordingListener>,
    scheduler: Arc<HeartbeatScheduler>,
}

fn fixture() -> Fixture {
    let clock = Arc::new(FakeClock::new(T0));
    let worker = Arc::new(ManualWorker::new(clock.clone()));
    let config = Arc::new(SharedConfig::default());
    let target = TargetLoop::default();
    let listener = Arc::new(RecordingListener::default());
    let scheduler = HeartbeatScheduler::new(
        worker.clone(),
        clock.clone(),
        config.clone(),
        Arc::new(RunLoopHeartbeat::new(target.clone(), clock.clone())),
        listener.clone(),
    );
    Fixture {
        clock,
        worker,
        config,
        target,
        listener,
        scheduler,
    }
}

fn with_source(source: MockSource) -> (Arc<ManualWorker>, Arc<HeartbeatScheduler>) {
    let clock = Arc::new(FakeClock::new(T0));
    let worker = Arc::new(ManualWorker::new(clock.clone()));
    let scheduler = HeartbeatScheduler::new(
        worker.clone(),
        clock,
        Arc::new(SharedConfig::default()),
        Arc::new(source),
        Arc::new(RecordingListener::default()),
    );
    (worker, scheduler)
}

impl Fixture {
    /// Advance in sampling-interval steps with a responsive target
    fn run_responsive(&self, ms: u64) {
        for _ in 0..ms / 100 {
            self.worker.advance(100);
            self.target.drain();
            self.worker.run_until_idle();
        }
    }
}

#[test]
fn test_responsive_target_reports_nothing() {
    let f = fixture();
    assert!(f.scheduler.start());

    f.run_responsive(5_000);

    assert!(f.listener.events().is_empty());
    assert!(!f.scheduler.state().blocked);
}

#[test]
fn test_blockage_detected_and_resolved() {
    let f = fixture();
    f.scheduler.start();
    f.worker.run_until_idle();
    assert_eq!(f.target.queued(), 1);

    // Exactly at the threshold nothing fires
    f.worker.advance(1_000);
    assert!(f.listener.events().is_empty());
    // The pending probe is not re-posted
    assert_eq!(f.target.queued(), 1);

    f.worker.advance(100);
    assert_eq!(
        f.listener.events(),
        vec![
            (BlockageEvent::Blocked, T0),
            (BlockageEvent::BlockedInterval, T0 + 1_100),
        ]
    );

    f.worker.advance(200);
    assert_eq!(f.listener.events().len(), 4);

    f.clock.tick(50);
    f.target.drain();
    f.worker.run_until_idle();

    let events = f.listener.events();
    assert_eq!(events.last(), Some(&(BlockageEvent::Unblocked, T0 + 1_350)));
    assert!(!f.scheduler.state().blocked);
}

#[test]
fn test_start_twice_keeps_one_tick_chain() {
    let mut source = MockSource::new();
    // Ticks at T0, T0+100 .. T0+1000
    source.expect_post_probe().times(11).returning(|_| Ok(()));
    let (worker, scheduler) = with_source(source);

    assert!(scheduler.start());
    assert!(!scheduler.start());
    assert_eq!(worker.pending_count(), 1);

    worker.advance(1_000);
    assert_eq!(worker.pending_count(), 1);
    assert!(scheduler.stop());
}

#[test]
fn test_probe_failure_keeps_ticking() {
    let mut source = MockSource::new();
    source
        .expect_post_probe()
        .times(3)
        .returning(|_| Err(HeartbeatError::ProbeRejected));
    let (worker, scheduler) = with_source(source);

    scheduler.start();
    worker.advance(200);

    assert!(scheduler.is_started());
    assert_eq!(worker.pending_count(), 1);
    scheduler.stop();
}

#[test]
fn test_stop_cancels_and_restart_does_not_see_gap() {
    let f = fixture();
    f.scheduler.start();
    f.run_responsive(500);

    assert!(f.scheduler.stop());
    assert_eq!(f.worker.pending_count(), 0);
    assert_eq!(f.worker.advance(5_000), 0);

    // A long pause while stopped must not read as a blockage
    f.clock.tick(30_000);
    assert!(f.scheduler.start());
    let restart = f.clock.now();
    assert_eq!(f.scheduler.state().last_target_ack, restart);

    f.run_responsive(1_000);
    assert!(f.listener.events().is_empty());
}

#[test]
fn test_interval_change_reschedules_without_restart() {
    let f = fixture();
    f.scheduler.start();
    f.worker.run_until_idle();
    assert_eq!(f.worker.next_due(), Some(T0 + 100));

    f.config.modify(|c| c.sampling_interval_ms = 250).unwrap();
    f.worker.advance(100);
    assert_eq!(f.worker.next_due(), Some(T0 + 350));
    assert_eq!(f.worker.pending_count(), 1);
}

#[test]
fn test_threshold_change_applies_on_next_tick() {
    let f = fixture();
    f.config.modify(|c| c.min_duration_threshold_ms = 2_000).unwrap();
    f.scheduler.start();

    f.worker.advance(1_500);
    assert!(f.listener.events().is_empty());

    f.config.modify(|c| c.min_duration_threshold_ms = 1_000).unwrap();
    f.worker.advance(100);
    assert_eq!(f.listener.kinds()[0], BlockageEvent::Blocked);
}

#[test]
fn test_process_freeze_is_not_a_blockage() {
    let f = fixture();
    f.scheduler.start();
    f.run_responsive(300);

    // Nothing ran for 70s, then the overdue tick fires
    f.clock.tick(70_000);
    f.worker.run_until_idle();

    assert!(f.listener.events().is_empty());
    let state = f.scheduler.state();
    assert_eq!(state.last_target_ack, f.clock.now());
    assert!(!state.blocked);
}

#[test]
fn test_ack_after_stop_is_ignored() {
    let f = fixture();
    f.scheduler.start();
    f.worker.run_until_idle();
    f.scheduler.stop();

    f.clock.tick(100);
    f.target.drain();
    f.worker.run_until_idle();

    assert!(f.listener.events().is_empty());
    assert!(!f.scheduler.is_started());
}

#[test]
fn test_stop_while_blocked_closes_blockage() {
    let f = fixture();
    f.scheduler.start();
    f.worker.advance(1_200);
    f.clock.tick(30);

    assert!(f.scheduler.stop());
    assert_eq!(
        f.listener.events().last(),
        Some(&(BlockageEvent::Unblocked, T0 + 1_200))
    );
    assert!(!f.scheduler.state().blocked);
}

#[test]
fn test_halt_leaves_blockage_open() {
    let f = fixture();
    f.scheduler.start();
    f.worker.advance(1_200);

    assert!(f.scheduler.halt());
    assert_eq!(f.listener.kinds().last(), Some(&BlockageEvent::BlockedInterval));
    assert!(!f.scheduler.is_started());
}
