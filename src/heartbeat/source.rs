/*!
 * Heartbeat Source
 *
 * Boundary to the target run-loop. A probe is a job posted onto the run-loop;
 * when the run-loop drains it, the acknowledgment callback fires with the
 * drain time.
 */

use crate::core::clock::Clock;
use crate::core::errors::HeartbeatError;
use crate::core::types::{AckCallback, Job};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Posts probes to the target run-loop
pub trait HeartbeatSource: Send + Sync {
    /// Ask the target to call `on_ack` once it is free again
    ///
    /// A probe that is still pending is not posted a second time.
    fn post_probe(&self, on_ack: AckCallback) -> Result<(), HeartbeatError>;
}

/// Any cooperative single-threaded event loop or mailbox
pub trait RunLoop: Send + Sync {
    /// Enqueue a job; false if the loop is closed
    fn post(&self, job: Job) -> bool;
}

impl RunLoop for flume::Sender<Job> {
    fn post(&self, job: Job) -> bool {
        self.send(job).is_ok()
    }
}

/// [`HeartbeatSource`] over a [`RunLoop`], with at most one probe in flight
pub struct RunLoopHeartbeat<R> {
    run_loop: R,
    clock: Arc<dyn Clock>,
    pending: Arc<AtomicBool>,
}

impl<R: RunLoop> RunLoopHeartbeat<R> {
    pub fn new(run_loop: R, clock: Arc<dyn Clock>) -> Self {
        Self {
            run_loop,
            clock,
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a probe has been posted but not drained yet
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl<R: RunLoop> HeartbeatSource for RunLoopHeartbeat<R> {
    fn post_probe(&self, on_ack: AckCallback) -> Result<(), HeartbeatError> {
        if self.pending.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let pending = Arc::clone(&self.pending);
        let clock = Arc::clone(&self.clock);
        let probe: Job = Box::new(move || {
            let drained_at = clock.now();
            pending.store(false, Ordering::Release);
            on_ack(drained_at);
        });

        if self.run_loop.post(probe) {
            Ok(())
        } else {
            self.pending.store(false, Ordering::Release);
            Err(HeartbeatError::ProbeRejected)
        }
    }
}
