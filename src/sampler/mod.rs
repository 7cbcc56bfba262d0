/*!
 * Blockage Sampler
 *
 * Turns blockage transitions into a bounded, prioritized collection of
 * intervals and stack samples, served to readers as immutable snapshots.
 */

mod blockage;
mod capture;
mod intervals;
mod stats;
mod types;

pub use blockage::BlockageSampler;
pub use capture::{truncate_frames, FrameGuard, ShadowStack, StackSource};
pub use intervals::IntervalSet;
pub use stats::{SamplerStats, SamplerStatsSnapshot};
pub use types::{BlockageInterval, IntervalCode, Sample, SampleCode, ThreadSnapshot, ThreadState};
