/*!
 * Task Handle
 * Cancellation token shared between a scheduled job and its owner
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle to a submitted or scheduled job
///
/// Cancellation is immediate: once `cancel` returns, the job body will not
/// start. A job that is already running completes normally.
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<tokio::task::AbortHandle>,
}

impl TaskHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_abort(mut self, abort: tokio::task::AbortHandle) -> Self {
        self.abort = Some(abort);
        self
    }

    pub(crate) fn token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Cancel the job; returns false if it was already cancelled
    pub fn cancel(&self) -> bool {
        let was_cancelled = self.cancelled.swap(true, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
        !was_cancelled
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
