/*!
 * Tokio Worker
 *
 * Dedicated one-thread tokio runtime executing watchdog jobs.
 *
 * # Shutdown
 *
 * 1. **Preferred Path:** `shutdown()` - rejects new work, gives in-flight jobs
 *    a short grace period, then stops the runtime.
 * 2. **Fallback Path:** `Drop` - background shutdown, safe even when the last
 *    reference is released on the worker thread itself.
 *
 * Rejections after shutdown are reported as [`WorkerError::Rejected`] and are
 * expected during teardown.
 */

use super::{ScheduledWorker, TaskHandle};
use crate::core::errors::WorkerError;
use crate::core::limits::{WORKER_SHUTDOWN_TIMEOUT, WORKER_THREAD_NAME};
use crate::core::types::Job;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info};

/// Single-thread scheduled worker backed by tokio
pub struct TokioWorker {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    shutdown: AtomicBool,
}

impl TokioWorker {
    /// Spawn the worker thread
    pub fn new() -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(WORKER_THREAD_NAME)
            .enable_time()
            .build()?;
        let handle = runtime.handle().clone();

        info!(thread = WORKER_THREAD_NAME, "Watchdog worker started");

        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            handle,
            shutdown: AtomicBool::new(false),
        })
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Stop accepting work and stop the runtime
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(runtime) = self.runtime.lock().take() {
            // Blocking shutdown is not allowed from inside a runtime
            if Handle::try_current().is_ok() {
                runtime.shutdown_background();
            } else {
                runtime.shutdown_timeout(WORKER_SHUTDOWN_TIMEOUT);
            }
        }
        info!("Watchdog worker shut down");
    }
}

impl ScheduledWorker for TokioWorker {
    fn submit(&self, job: Job) -> Result<TaskHandle, WorkerError> {
        self.schedule(job, Duration::ZERO)
    }

    fn schedule(&self, job: Job, delay: Duration) -> Result<TaskHandle, WorkerError> {
        if self.is_shutdown() {
            debug!("Watchdog worker rejected job after shutdown");
            return Err(WorkerError::Rejected("worker shut down"));
        }

        let task = TaskHandle::new();
        let cancelled = task.token();
        let join = self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if !cancelled.load(Ordering::SeqCst) {
                job();
            }
        });

        Ok(task.with_abort(join.abort_handle()))
    }
}

impl Drop for TokioWorker {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(runtime) = self.runtime.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}
