/*!
 * App State
 */

use std::sync::atomic::{AtomicBool, Ordering};

/// Reports whether the host app is currently in the background
pub trait AppStateSource: Send + Sync {
    fn is_background(&self) -> bool;
}

/// Atomic flag flipped by the host's lifecycle callbacks
#[derive(Debug, Default)]
pub struct AppStateFlag {
    background: AtomicBool,
}

impl AppStateFlag {
    pub fn new(background: bool) -> Self {
        Self {
            background: AtomicBool::new(background),
        }
    }

    pub fn set_background(&self, background: bool) {
        self.background.store(background, Ordering::Release);
    }
}

impl AppStateSource for AppStateFlag {
    fn is_background(&self) -> bool {
        self.background.load(Ordering::Acquire)
    }
}
