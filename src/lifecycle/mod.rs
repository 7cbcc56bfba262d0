/*!
 * Lifecycle
 *
 * Wires the heartbeat scheduler and the sampler to app foreground/background
 * transitions, session boundaries and crashes.
 */

mod app_state;
mod service;

pub use app_state::{AppStateFlag, AppStateSource};
pub use service::{BlockageService, CaptureState};
