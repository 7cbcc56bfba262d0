/*!
 * Core Module
 * Fundamental watchdog types, time source and error handling
 */

pub mod clock;
pub mod errors;
pub mod limits;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use clock::{Clock, FakeClock, SystemClock};
pub use errors::*;
pub use types::*;
