/*!
 * Scheduled Worker
 *
 * Single-thread executor with delayed submission and immediate cancellation.
 * Every heartbeat tick and every sampler write runs on one worker, which is
 * what makes the sampler single-writer.
 */

mod handle;
mod manual;
mod runtime;

pub use handle::TaskHandle;
pub use manual::ManualWorker;
pub use runtime::TokioWorker;

use crate::core::errors::WorkerError;
use crate::core::types::Job;
use std::time::Duration;

/// Executor seam used by the heartbeat scheduler and lifecycle service
pub trait ScheduledWorker: Send + Sync {
    /// Run `job` as soon as possible
    fn submit(&self, job: Job) -> Result<TaskHandle, WorkerError>;

    /// Run `job` once after `delay`
    fn schedule(&self, job: Job, delay: Duration) -> Result<TaskHandle, WorkerError>;
}
