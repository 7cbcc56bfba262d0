/*!
 * Blockage Service
 *
 * Orchestrates capture across app-state changes:
 *
 * ```text
 *   Stopped ──start_capture (fg)──▶ CapturingForeground ◀──on_foreground──┐
 *      │                                  │                                │
 *      └─start_capture (bg)──▶ CapturingBackgroundPendingStop ─────────────┘
 *                                         │ delayed check, still bg
 *                                         ▼
 *                                      Stopped
 *
 *   any ──handle_crash──▶ Crashed (terminal)
 * ```
 *
 * Foreground, background and crash transitions run on the watchdog worker,
 * after any acknowledgment the target already queued there. Reads
 * (`snapshot*`) go straight to the sampler's current generation and never
 * wait on the worker.
 */

use super::AppStateSource;
use crate::config::ConfigSource;
use crate::core::clock::Clock;
use crate::core::limits::BACKGROUND_STOP_DELAY;
use crate::core::types::TimestampMs;
use crate::export::{map_interval_to_span, IntervalRecord, SpanRecord};
use crate::heartbeat::{HeartbeatScheduler, HeartbeatSource};
use crate::sampler::{BlockageSampler, IntervalSet, SamplerStatsSnapshot, StackSource};
use crate::worker::{ScheduledWorker, TaskHandle};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    Stopped,
    CapturingForeground,
    CapturingBackgroundPendingStop,
    Crashed,
}

struct Inner {
    state: CaptureState,
    background_check: Option<TaskHandle>,
}

impl Inner {
    fn cancel_background_check(&mut self) {
        if let Some(task) = self.background_check.take() {
            task.cancel();
        }
    }
}

pub struct BlockageService {
    clock: Arc<dyn Clock>,
    worker: Arc<dyn ScheduledWorker>,
    app_state: Arc<dyn AppStateSource>,
    scheduler: Arc<HeartbeatScheduler>,
    sampler: Arc<BlockageSampler>,
    inner: Mutex<Inner>,
    this: Weak<Self>,
}

impl BlockageService {
    pub fn new(
        clock: Arc<dyn Clock>,
        config: Arc<dyn ConfigSource>,
        worker: Arc<dyn ScheduledWorker>,
        app_state: Arc<dyn AppStateSource>,
        heartbeat: Arc<dyn HeartbeatSource>,
        stacks: Arc<dyn StackSource>,
    ) -> Arc<Self> {
        let sampler = Arc::new(BlockageSampler::new(
            Arc::clone(&clock),
            Arc::clone(&config),
            stacks,
        ));
        let scheduler = HeartbeatScheduler::new(
            Arc::clone(&worker),
            Arc::clone(&clock),
            config,
            heartbeat,
            sampler.clone(),
        );

        Arc::new_cyclic(|this| Self {
            clock,
            worker,
            app_state,
            scheduler,
            sampler,
            inner: Mutex::new(Inner {
                state: CaptureState::Stopped,
                background_check: None,
            }),
            this: this.clone(),
        })
    }

    /// Begin monitoring
    ///
    /// In the background, monitoring still starts but a delayed check stops
    /// it again unless the app reaches the foreground first.
    pub fn start_capture(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CaptureState::Crashed {
            return;
        }

        self.scheduler.start();
        if self.app_state.is_background() {
            inner.cancel_background_check();
            inner.background_check = self.schedule_background_check();
            inner.state = CaptureState::CapturingBackgroundPendingStop;
        } else {
            inner.state = CaptureState::CapturingForeground;
        }
        info!(state = ?inner.state, "Blockage capture started");
    }

    /// Resume monitoring, treating `timestamp` as the last sign of life
    pub fn on_foreground(&self, timestamp: TimestampMs) {
        self.on_worker(move |service: &Self| service.apply_foreground(timestamp));
    }

    /// Stop monitoring; an ongoing blockage ends at its last observed tick
    pub fn on_background(&self, timestamp: TimestampMs) {
        self.on_worker(move |service: &Self| service.apply_background(timestamp));
    }

    /// Stop probing for good; captured data stays readable
    ///
    /// Later lifecycle calls are refused at once; ticking halts on the worker.
    pub fn handle_crash(&self) {
        {
            let mut inner = self.inner.lock();
            inner.cancel_background_check();
            inner.state = CaptureState::Crashed;
        }
        self.on_worker(|service: &Self| {
            service.scheduler.halt();
        });
        info!("Blockage capture halted after crash");
    }

    /// Prune completed intervals on the worker
    pub fn on_post_session_change(&self) {
        let sampler = Arc::clone(&self.sampler);
        if let Err(err) = self
            .worker
            .submit(Box::new(move || sampler.on_post_session_change()))
        {
            debug!(error = %err, "Worker unavailable, pruning inline");
            self.sampler.on_post_session_change();
        }
    }

    pub fn capture_state(&self) -> CaptureState {
        self.inner.lock().state
    }

    /// Current generation of tracked intervals
    pub fn snapshot(&self) -> Arc<IntervalSet> {
        self.sampler.snapshot()
    }

    pub fn snapshot_records(&self) -> Vec<IntervalRecord> {
        self.sampler
            .snapshot()
            .iter()
            .map(|interval| IntervalRecord::from(interval.as_ref()))
            .collect()
    }

    pub fn snapshot_spans(&self) -> Vec<SpanRecord> {
        let now = self.clock.now();
        self.sampler
            .snapshot()
            .iter()
            .map(|interval| map_interval_to_span(interval, now))
            .collect()
    }

    pub fn stats(&self) -> SamplerStatsSnapshot {
        self.sampler.stats()
    }

    pub fn scheduler(&self) -> &Arc<HeartbeatScheduler> {
        &self.scheduler
    }

    pub fn sampler(&self) -> &Arc<BlockageSampler> {
        &self.sampler
    }

    fn apply_foreground(&self, timestamp: TimestampMs) {
        let mut inner = self.inner.lock();
        if inner.state == CaptureState::Crashed {
            return;
        }

        inner.cancel_background_check();
        self.scheduler.start();
        self.scheduler.reset_state(timestamp);
        inner.state = CaptureState::CapturingForeground;
    }

    fn apply_background(&self, timestamp: TimestampMs) {
        let mut inner = self.inner.lock();
        if inner.state == CaptureState::Crashed {
            return;
        }

        inner.cancel_background_check();
        self.scheduler.stop();
        self.scheduler.reset_state(timestamp);
        inner.state = CaptureState::Stopped;
    }

    /// Queue a transition behind work already on the worker; inline if it is gone
    fn on_worker<F>(&self, transition: F)
    where
        F: Fn(&Self) + Clone + Send + 'static,
    {
        let this = self.this.clone();
        let queued = transition.clone();
        let job = Box::new(move || {
            if let Some(service) = this.upgrade() {
                queued(&service);
            }
        });
        if let Err(err) = self.worker.submit(job) {
            debug!(error = %err, "Worker unavailable, applying lifecycle transition inline");
            transition(self);
        }
    }

    fn schedule_background_check(&self) -> Option<TaskHandle> {
        let this = self.this.clone();
        let job = Box::new(move || {
            if let Some(service) = this.upgrade() {
                service.stop_if_still_background();
            }
        });
        match self.worker.schedule(job, BACKGROUND_STOP_DELAY) {
            Ok(task) => Some(task),
            Err(err) => {
                debug!(error = %err, "Background stop check not scheduled");
                None
            }
        }
    }

    fn stop_if_still_background(&self) {
        let mut inner = self.inner.lock();
        inner.background_check = None;
        if inner.state != CaptureState::CapturingBackgroundPendingStop {
            return;
        }
        if self.app_state.is_background() {
            self.scheduler.stop();
            inner.state = CaptureState::Stopped;
            info!("App still in background, blockage capture stopped");
        } else {
            inner.state = CaptureState::CapturingForeground;
        }
    }
}
