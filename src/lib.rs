/*!
 * Blockage Watchdog Library
 *
 * Detects when a target run-loop stops acknowledging heartbeats and records
 * bounded, prioritized stack samples for every blockage.
 *
 * Data flows one way: heartbeat source → scheduler → sampler → lifecycle
 * service → export.
 */

pub mod config;
pub mod core;
pub mod export;
pub mod heartbeat;
pub mod lifecycle;
pub mod monitoring;
pub mod sampler;
pub mod worker;

// Re-exports
pub use config::{ConfigSource, SharedConfig, WatchdogConfig};
pub use crate::core::{
    Clock, ConfigError, FakeClock, HeartbeatError, SystemClock, TimestampMs, WatchdogError,
    WatchdogResult, WorkerError,
};
pub use export::{IntervalRecord, SpanRecord};
pub use heartbeat::{
    BlockageEvent, BlockageListener, HeartbeatScheduler, HeartbeatSource, RunLoop,
    RunLoopHeartbeat,
};
pub use lifecycle::{AppStateFlag, AppStateSource, BlockageService, CaptureState};
pub use monitoring::init_tracing;
pub use sampler::{
    BlockageInterval, BlockageSampler, IntervalCode, IntervalSet, Sample, SampleCode,
    ShadowStack, StackSource, ThreadSnapshot, ThreadState,
};
pub use worker::{ManualWorker, ScheduledWorker, TaskHandle, TokioWorker};
