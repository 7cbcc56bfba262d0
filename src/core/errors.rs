/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(
        code(config::invalid_value),
        help("Check the watchdog configuration; thresholds and intervals must be positive.")
    )]
    InvalidValue { field: &'static str, reason: String },

    #[error("Failed to parse configuration: {0}")]
    #[diagnostic(
        code(config::parse_failed),
        help("Configuration must be a JSON object with snake_case keys.")
    )]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read configuration: {0}")]
    #[diagnostic(code(config::io_error), help("Check the file path and permissions."))]
    Io(#[from] std::io::Error),
}

/// Scheduled worker errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum WorkerError {
    #[error("Worker rejected task: {0}")]
    #[diagnostic(
        code(worker::rejected),
        help("The worker has been shut down. Rejections are expected during teardown.")
    )]
    Rejected(&'static str),
}

/// Heartbeat source errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum HeartbeatError {
    #[error("Run-loop refused heartbeat probe")]
    #[diagnostic(
        code(heartbeat::probe_rejected),
        help("The target run-loop is closed or no longer draining its queue.")
    )]
    ProbeRejected,
}

/// Unified watchdog error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum WatchdogError {
    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Worker error: {0}")]
    #[diagnostic(transparent)]
    Worker(#[from] WorkerError),

    #[error("Heartbeat error: {0}")]
    #[diagnostic(transparent)]
    Heartbeat(#[from] HeartbeatError),
}
