/*!
 * Heartbeat Scheduler
 *
 * Drives the detector from the watchdog worker. Each tick posts a probe,
 * evaluates the state, and schedules its own successor using the interval
 * from the configuration in effect at that moment.
 *
 * # Task Ownership
 *
 * At most one tick task is live. Every start/stop bumps a generation number;
 * a tick that finds a different generation (or a stopped scheduler) exits
 * without rescheduling, so stale tasks can never fork a second chain.
 */

use super::{BlockageListener, BlockedThreadDetector, HeartbeatSource, MonitoringState};
use crate::config::ConfigSource;
use crate::core::clock::Clock;
use crate::core::limits::MIN_SAMPLING_INTERVAL_MS;
use crate::core::types::{AckCallback, TimestampMs};
use crate::worker::{ScheduledWorker, TaskHandle};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

struct Inner {
    state: MonitoringState,
    generation: u64,
    task: Option<TaskHandle>,
}

pub struct HeartbeatScheduler {
    worker: Arc<dyn ScheduledWorker>,
    clock: Arc<dyn Clock>,
    config: Arc<dyn ConfigSource>,
    source: Arc<dyn HeartbeatSource>,
    detector: BlockedThreadDetector,
    inner: Mutex<Inner>,
    this: Weak<Self>,
}

impl HeartbeatScheduler {
    pub fn new(
        worker: Arc<dyn ScheduledWorker>,
        clock: Arc<dyn Clock>,
        config: Arc<dyn ConfigSource>,
        source: Arc<dyn HeartbeatSource>,
        listener: Arc<dyn BlockageListener>,
    ) -> Arc<Self> {
        let detector = BlockedThreadDetector::new(Arc::clone(&clock), listener);
        Arc::new_cyclic(|this| Self {
            worker,
            clock,
            config,
            source,
            detector,
            inner: Mutex::new(Inner {
                state: MonitoringState::default(),
                generation: 0,
                task: None,
            }),
            this: this.clone(),
        })
    }

    /// Begin ticking; returns false if already started
    pub fn start(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state.started {
            return false;
        }

        let now = self.clock.now();
        inner.state.reset(now);
        inner.state.started = true;
        inner.generation += 1;
        self.schedule_tick(&mut inner, Duration::ZERO);

        info!(
            interval_ms = self.config.current().sampling_interval_ms,
            "Heartbeat monitoring started"
        );
        true
    }

    /// Cancel the outstanding tick and reset state; returns false if not started
    ///
    /// An ongoing blockage is closed at the last tick that observed it.
    pub fn stop(&self) -> bool {
        self.shutdown(true)
    }

    /// Like [`stop`](Self::stop), but an ongoing blockage stays open
    pub fn halt(&self) -> bool {
        self.shutdown(false)
    }

    fn shutdown(&self, release: bool) -> bool {
        let mut inner = self.inner.lock();
        if !inner.state.started {
            return false;
        }

        if let Some(task) = inner.task.take() {
            task.cancel();
        }
        if release {
            self.detector.release(&mut inner.state);
        }
        inner.generation += 1;
        inner.state.started = false;
        inner.state.reset(self.clock.now());

        info!("Heartbeat monitoring stopped");
        true
    }

    /// Re-baseline timestamps at an app-state transition
    ///
    /// An ongoing blockage is closed first so the sampler is not left with an
    /// interval nothing will end.
    pub fn reset_state(&self, timestamp: TimestampMs) {
        let mut inner = self.inner.lock();
        self.detector.release(&mut inner.state);
        inner.state.reset(timestamp);
    }

    pub fn is_started(&self) -> bool {
        self.inner.lock().state.started
    }

    /// Copy of the current monitoring state
    pub fn state(&self) -> MonitoringState {
        self.inner.lock().state
    }

    /// Acknowledgment from the target run-loop, delivered on the worker
    pub fn on_target_ack(&self, timestamp: TimestampMs) {
        let mut inner = self.inner.lock();
        if !inner.state.started {
            return;
        }
        self.detector.on_target_ack(&mut inner.state, timestamp);
    }

    fn tick(&self, generation: u64) {
        let config = self.config.current();
        let mut inner = self.inner.lock();
        if !inner.state.started || inner.generation != generation {
            return;
        }

        let now = self.clock.now();
        if let Err(err) = self.source.post_probe(self.ack_callback()) {
            warn!(error = %err, "Failed to post heartbeat probe");
        }
        self.detector.on_monitor_tick(&mut inner.state, now, &config);

        let next = Duration::from_millis(config.sampling_interval_ms.max(MIN_SAMPLING_INTERVAL_MS));
        self.schedule_tick(&mut inner, next);
    }

    fn schedule_tick(&self, inner: &mut Inner, delay: Duration) {
        let this = self.this.clone();
        let generation = inner.generation;
        let job = Box::new(move || {
            if let Some(scheduler) = this.upgrade() {
                scheduler.tick(generation);
            }
        });

        inner.task = match self.worker.schedule(job, delay) {
            Ok(task) => Some(task),
            Err(err) => {
                debug!(error = %err, "Heartbeat tick not scheduled");
                None
            }
        };
    }

    /// Acknowledgments hop back onto the worker so all state writes stay there
    fn ack_callback(&self) -> AckCallback {
        let this = self.this.clone();
        let worker = Arc::clone(&self.worker);
        Arc::new(move |timestamp| {
            let this = this.clone();
            let job = Box::new(move || {
                if let Some(scheduler) = this.upgrade() {
                    scheduler.on_target_ack(timestamp);
                }
            });
            if let Err(err) = worker.submit(job) {
                debug!(error = %err, "Heartbeat acknowledgment dropped");
            }
        })
    }
}
