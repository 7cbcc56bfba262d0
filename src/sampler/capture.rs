/*!
 * Stack Capture
 *
 * [`StackSource`] is the seam to whatever can read the target thread's
 * stack. [`ShadowStack`] is a cooperative source: the target thread marks
 * the frames it enters with RAII guards and the watchdog copies them out.
 */

use super::types::{ThreadSnapshot, ThreadState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Reads the current stack of the target thread
pub trait StackSource: Send + Sync {
    /// Full, untruncated stack with the innermost frame first
    fn capture(&self) -> Option<ThreadSnapshot>;
}

/// Keep the innermost `limit` frames, remembering the original depth
pub fn truncate_frames(mut snapshot: ThreadSnapshot, limit: usize) -> ThreadSnapshot {
    snapshot.frame_count = snapshot.frame_count.max(snapshot.lines.len());
    snapshot.lines.truncate(limit);
    snapshot
}

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

/// Frames published by the target thread itself
#[derive(Debug)]
pub struct ShadowStack {
    thread_id: u64,
    name: String,
    priority: i32,
    frames: Mutex<Vec<Arc<str>>>,
}

impl ShadowStack {
    pub fn new(name: impl Into<String>, priority: i32) -> Arc<Self> {
        Arc::new(Self {
            thread_id: NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            priority,
            frames: Mutex::new(Vec::new()),
        })
    }

    /// Shadow stack named after the calling thread
    pub fn for_current_thread() -> Arc<Self> {
        let current = std::thread::current();
        Self::new(current.name().unwrap_or("unnamed"), 5)
    }

    /// Push a frame until the guard drops
    pub fn enter(self: &Arc<Self>, frame: impl Into<Arc<str>>) -> FrameGuard {
        self.frames.lock().push(frame.into());
        FrameGuard {
            stack: Arc::clone(self),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }
}

impl StackSource for ShadowStack {
    fn capture(&self) -> Option<ThreadSnapshot> {
        let lines: Vec<String> = self
            .frames
            .lock()
            .iter()
            .rev()
            .map(|frame| frame.to_string())
            .collect();

        let state = if lines.is_empty() {
            ThreadState::Waiting
        } else {
            ThreadState::Runnable
        };

        Some(ThreadSnapshot {
            thread_id: self.thread_id,
            name: self.name.clone(),
            state,
            priority: self.priority,
            frame_count: lines.len(),
            lines,
        })
    }
}

/// Pops its frame from the [`ShadowStack`] on drop
#[must_use = "the frame is popped as soon as the guard is dropped"]
pub struct FrameGuard {
    stack: Arc<ShadowStack>,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        self.stack.frames.lock().pop();
    }
}
