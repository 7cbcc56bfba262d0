/*!
 * Blockage Service Tests
 */

use crate::common::{DeepStack, TargetLoop, T0};
use blockage_watchdog::export::BLOCKAGE_SPAN_NAME;
use blockage_watchdog::{
    AppStateFlag, BlockageService, CaptureState, Clock, FakeClock, IntervalCode, ManualWorker,
    RunLoopHeartbeat, SharedConfig,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Fixture {
    clock: Arc<FakeClock>,
    worker: Arc<ManualWorker>,
    app_state: Arc<AppStateFlag>,
    target: TargetLoop,
    service: Arc<BlockageService>,
}

fn fixture(background: bool) -> Fixture {
    let clock = Arc::new(FakeClock::new(T0));
    let worker = Arc::new(ManualWorker::new(clock.clone()));
    let app_state = Arc::new(AppStateFlag::new(background));
    let target = TargetLoop::default();
    let service = BlockageService::new(
        clock.clone(),
        Arc::new(SharedConfig::default()),
        worker.clone(),
        app_state.clone(),
        Arc::new(RunLoopHeartbeat::new(target.clone(), clock.clone())),
        Arc::new(DeepStack { depth: 20 }),
    );
    Fixture {
        clock,
        worker,
        app_state,
        target,
        service,
    }
}

impl Fixture {
    fn unblock_target(&self) {
        self.target.drain();
        self.worker.run_until_idle();
    }
}

#[test]
fn test_start_in_foreground() {
    let f = fixture(false);
    f.service.start_capture();

    assert_eq!(f.service.capture_state(), CaptureState::CapturingForeground);
    assert!(f.service.scheduler().is_started());
}

#[test]
fn test_background_start_stops_after_delay() {
    let f = fixture(true);
    f.service.start_capture();
    assert_eq!(
        f.service.capture_state(),
        CaptureState::CapturingBackgroundPendingStop
    );
    assert!(f.service.scheduler().is_started());

    f.worker.advance(9_900);
    f.unblock_target();
    assert!(f.service.scheduler().is_started());

    f.worker.advance(200);
    assert_eq!(f.service.capture_state(), CaptureState::Stopped);
    assert!(!f.service.scheduler().is_started());
    assert_eq!(f.worker.pending_count(), 0);
}

#[test]
fn test_foreground_before_delay_cancels_stop() {
    let f = fixture(true);
    f.service.start_capture();

    f.worker.advance(3_000);
    f.app_state.set_background(false);
    f.service.on_foreground(f.clock.now());
    f.unblock_target();
    // The blockage that began while pending is closed at the transition
    assert_eq!(f.service.snapshot()[0].end_time, Some(T0 + 3_000));

    f.worker.advance(8_000);
    assert_eq!(f.service.capture_state(), CaptureState::CapturingForeground);
    assert!(f.service.scheduler().is_started());
}

#[test]
fn test_background_gap_is_not_a_blockage() {
    let f = fixture(false);
    f.service.start_capture();
    f.worker.advance(500);
    f.unblock_target();

    f.app_state.set_background(true);
    f.service.on_background(f.clock.now());
    f.worker.run_until_idle();
    assert_eq!(f.service.capture_state(), CaptureState::Stopped);
    assert!(!f.service.scheduler().is_started());

    f.clock.tick(120_000);
    f.app_state.set_background(false);
    let resumed = f.clock.now();
    f.service.on_foreground(resumed);
    f.worker.run_until_idle();
    assert_eq!(f.service.scheduler().state().last_target_ack, resumed);

    for _ in 0..10 {
        f.worker.advance(100);
        f.unblock_target();
    }
    assert!(f.service.snapshot().is_empty());
}

#[test]
fn test_blockage_flows_to_spans() {
    let f = fixture(false);
    f.service.start_capture();

    f.worker.advance(1_500);
    let during = f.service.snapshot();
    assert_eq!(during.len(), 1);
    assert!(during[0].is_open());
    assert_eq!(during[0].start_time, T0);
    assert_eq!(during[0].sample_count(), 5);

    f.clock.tick(50);
    f.unblock_target();

    let records = f.service.snapshot_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].end_time, Some(T0 + 1_550));
    assert_eq!(records[0].code, IntervalCode::Default);
    assert_eq!(records[0].samples.as_ref().map(Vec::len), Some(5));

    let spans = f.service.snapshot_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name, BLOCKAGE_SPAN_NAME);
    assert_eq!(spans[0].end_time_unix_nano, (T0 + 1_550) * 1_000_000);
    assert_eq!(spans[0].events.len(), 5);
    assert_eq!(spans[0].events[0].attribute("frame_count"), Some("20"));
}

#[test]
fn test_crash_stops_probing_and_keeps_data() {
    let f = fixture(false);
    f.service.start_capture();
    f.worker.advance(1_200);
    assert_eq!(f.service.snapshot().len(), 1);

    f.service.handle_crash();
    assert_eq!(f.service.capture_state(), CaptureState::Crashed);
    assert_eq!(f.worker.run_until_idle(), 1);
    assert!(!f.service.scheduler().is_started());
    assert_eq!(f.worker.advance(5_000), 0);

    // Terminal: later lifecycle signals do not resume probing
    f.service.on_foreground(f.clock.now());
    f.service.start_capture();
    f.worker.run_until_idle();
    assert!(!f.service.scheduler().is_started());
    assert!(f.service.snapshot()[0].is_open());

    let spans = f.service.snapshot_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].end_time_unix_nano, f.clock.now() * 1_000_000);
}

#[test]
fn test_session_change_prunes_on_worker() {
    let f = fixture(false);
    f.service.start_capture();
    f.worker.advance(1_200);
    f.unblock_target();
    f.worker.advance(1_200);
    assert_eq!(f.service.snapshot().len(), 2);

    f.service.on_post_session_change();
    assert_eq!(f.service.snapshot().len(), 2);

    f.worker.run_until_idle();
    let snapshot = f.service.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot[0].is_open());
}

#[test]
fn test_ack_queued_before_background_closes_interval() {
    let f = fixture(false);
    f.service.start_capture();
    f.worker.advance(1_500);
    assert!(f.service.snapshot()[0].is_open());

    // Target recovers, then the app is backgrounded before the ack is handled
    let acked = f.clock.tick(10);
    f.target.drain();
    f.app_state.set_background(true);
    f.service.on_background(f.clock.now());
    f.worker.run_until_idle();

    assert_eq!(f.service.capture_state(), CaptureState::Stopped);
    let snapshot = f.service.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].end_time, Some(acked));

    f.clock.tick(600_000);
    let spans = f.service.snapshot_spans();
    assert_eq!(spans[0].end_time_unix_nano, acked * 1_000_000);
}

#[test]
fn test_background_while_blocked_closes_at_last_tick() {
    let f = fixture(false);
    f.service.start_capture();
    f.worker.advance(1_500);
    f.clock.tick(10);

    f.app_state.set_background(true);
    f.service.on_background(f.clock.now());
    f.worker.run_until_idle();

    let snapshot = f.service.snapshot();
    assert_eq!(snapshot[0].end_time, Some(T0 + 1_500));
    assert_eq!(snapshot[0].sample_count(), 5);

    // The target drains much later; nothing reopens or moves the interval
    f.clock.tick(60_000);
    f.target.drain();
    f.worker.run_until_idle();
    assert_eq!(f.service.snapshot()[0].end_time, Some(T0 + 1_500));
}
