/*!
 * Watchdog Configuration
 *
 * Hot-reloadable settings consumed by the heartbeat scheduler and the sampler.
 * Consumers call [`ConfigSource::current`] on every tick/event and never keep
 * a copy, so a swapped configuration applies without a restart.
 */

use crate::core::errors::ConfigError;
use crate::core::limits::{
    DEFAULT_MAX_INTERVALS_PER_SESSION, DEFAULT_MAX_SAMPLES_PER_INTERVAL,
    DEFAULT_MIN_DURATION_THRESHOLD_MS, DEFAULT_SAMPLING_INTERVAL_MS,
    DEFAULT_STACKTRACE_FRAME_LIMIT,
};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Watchdog settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct WatchdogConfig {
    /// Whether stack samples are captured while blocked
    pub capture_enabled: bool,
    /// Target thread silence (ms) after which it counts as blocked
    pub min_duration_threshold_ms: u64,
    /// Heartbeat tick period (ms)
    pub sampling_interval_ms: u64,
    /// Completed intervals allowed to keep their samples
    pub max_intervals_per_session: usize,
    /// Samples per interval stored with a thread snapshot
    pub max_samples_per_interval: usize,
    /// Stack frames kept per snapshot
    pub stacktrace_frame_limit: usize,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            capture_enabled: true,
            min_duration_threshold_ms: DEFAULT_MIN_DURATION_THRESHOLD_MS,
            sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            max_intervals_per_session: DEFAULT_MAX_INTERVALS_PER_SESSION,
            max_samples_per_interval: DEFAULT_MAX_SAMPLES_PER_INTERVAL,
            stacktrace_frame_limit: DEFAULT_STACKTRACE_FRAME_LIMIT,
        }
    }
}

impl WatchdogConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling_interval_ms == 0 {
            return Err(invalid("sampling_interval_ms"));
        }
        if self.min_duration_threshold_ms == 0 {
            return Err(invalid("min_duration_threshold_ms"));
        }
        if self.stacktrace_frame_limit == 0 {
            return Err(invalid("stacktrace_frame_limit"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: "must be greater than zero".into(),
    }
}

/// Supplies the configuration in effect right now
pub trait ConfigSource: Send + Sync {
    fn current(&self) -> Arc<WatchdogConfig>;
}

impl ConfigSource for WatchdogConfig {
    fn current(&self) -> Arc<WatchdogConfig> {
        Arc::new(self.clone())
    }
}

/// Runtime-replaceable configuration
#[derive(Debug)]
pub struct SharedConfig {
    inner: ArcSwap<WatchdogConfig>,
}

impl SharedConfig {
    pub fn new(config: WatchdogConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: ArcSwap::from_pointee(config),
        })
    }

    /// Swap in a new configuration; invalid values leave the old one active
    pub fn update(&self, config: WatchdogConfig) -> Result<(), ConfigError> {
        config.validate()?;
        info!(
            threshold_ms = config.min_duration_threshold_ms,
            interval_ms = config.sampling_interval_ms,
            "Watchdog configuration updated"
        );
        self.inner.store(Arc::new(config));
        Ok(())
    }

    /// Apply a change to a copy of the current configuration
    pub fn modify<F>(&self, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut WatchdogConfig),
    {
        let mut next = (*self.inner.load_full()).clone();
        f(&mut next);
        self.update(next)
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            inner: ArcSwap::from_pointee(WatchdogConfig::default()),
        }
    }
}

impl ConfigSource for SharedConfig {
    fn current(&self) -> Arc<WatchdogConfig> {
        self.inner.load_full()
    }
}
