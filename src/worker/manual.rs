/*!
 * Manual Worker
 *
 * Deterministic executor driven by a [`FakeClock`]. Jobs run on the thread
 * that calls `run_until_idle`/`advance`, in (due time, submission) order.
 * Used by simulations and tests that must not sleep.
 */

use super::{ScheduledWorker, TaskHandle};
use crate::core::clock::{Clock, FakeClock};
use crate::core::errors::WorkerError;
use crate::core::types::{Job, TimestampMs};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Pending {
    job: Job,
    cancelled: Arc<AtomicBool>,
}

impl Pending {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct Queue {
    seq: u64,
    tasks: BTreeMap<(TimestampMs, u64), Pending>,
}

pub struct ManualWorker {
    clock: Arc<FakeClock>,
    queue: Mutex<Queue>,
    shutdown: AtomicBool,
}

impl ManualWorker {
    pub fn new(clock: Arc<FakeClock>) -> Self {
        Self {
            clock,
            queue: Mutex::new(Queue::default()),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn clock(&self) -> &Arc<FakeClock> {
        &self.clock
    }

    /// Reject all further submissions
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Live (not cancelled) tasks waiting to run
    pub fn pending_count(&self) -> usize {
        self.queue
            .lock()
            .tasks
            .values()
            .filter(|p| !p.is_cancelled())
            .count()
    }

    /// Due time of the earliest live task
    pub fn next_due(&self) -> Option<TimestampMs> {
        self.queue
            .lock()
            .tasks
            .iter()
            .find(|(_, p)| !p.is_cancelled())
            .map(|((due, _), _)| *due)
    }

    /// Run every task due at the current time, including ones they schedule
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(pending) = self.pop_due(self.clock.now()) {
            if !pending.is_cancelled() {
                (pending.job)();
                ran += 1;
            }
        }
        ran
    }

    /// Move the clock forward, running tasks at their due times
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.clock.now().saturating_add(ms);
        let mut ran = 0;
        loop {
            ran += self.run_until_idle();
            match self.next_due() {
                Some(due) if due <= target => self.clock.set(due.max(self.clock.now())),
                _ => break,
            }
        }
        self.clock.set(target);
        ran + self.run_until_idle()
    }

    fn pop_due(&self, now: TimestampMs) -> Option<Pending> {
        let mut queue = self.queue.lock();
        let key = *queue.tasks.keys().next()?;
        if key.0 > now {
            return None;
        }
        queue.tasks.remove(&key)
    }
}

impl ScheduledWorker for ManualWorker {
    fn submit(&self, job: Job) -> Result<TaskHandle, WorkerError> {
        self.schedule(job, Duration::ZERO)
    }

    fn schedule(&self, job: Job, delay: Duration) -> Result<TaskHandle, WorkerError> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(WorkerError::Rejected("worker shut down"));
        }

        let task = TaskHandle::new();
        let due = self
            .clock
            .now()
            .saturating_add(delay.as_millis() as TimestampMs);

        let mut queue = self.queue.lock();
        let seq = queue.seq;
        queue.seq += 1;
        queue.tasks.insert(
            (due, seq),
            Pending {
                job,
                cancelled: task.token(),
            },
        );
        Ok(task)
    }
}
