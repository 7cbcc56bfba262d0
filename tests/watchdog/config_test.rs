/*!
 * Configuration Loading Tests
 */

use blockage_watchdog::{ConfigError, ConfigSource, SharedConfig, WatchdogConfig, WatchdogError};
use miette::Diagnostic;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"min_duration_threshold_ms": 2000, "max_samples_per_interval": 10, "capture_enabled": false}}"#
    )
    .unwrap();

    let config = WatchdogConfig::from_file(file.path()).unwrap();
    assert_eq!(
        config,
        WatchdogConfig {
            min_duration_threshold_ms: 2_000,
            max_samples_per_interval: 10,
            capture_enabled: false,
            ..WatchdogConfig::default()
        }
    );
}

#[test]
fn test_invalid_file_contents() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();

    let err = WatchdogConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));

    let err = WatchdogError::from(err);
    assert_eq!(
        err.code().map(|c| c.to_string()).as_deref(),
        Some("config::parse_failed")
    );
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = WatchdogConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_rejected_update_keeps_previous() {
    let shared = SharedConfig::default();
    let invalid = WatchdogConfig {
        min_duration_threshold_ms: 0,
        ..WatchdogConfig::default()
    };

    assert!(shared.update(invalid).is_err());
    assert_eq!(shared.current().min_duration_threshold_ms, 1_000);
}
