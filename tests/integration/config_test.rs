use std::fs;
use std::time::Duration;

use tempfile::TempDir;
use win_os_info::core::{ErrorPolicy, OutputFormat, Strategy};
use win_os_info::Config;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.strategy, Strategy::Registry);
    assert!(config.os_version && config.update_history && config.update_settings);
    assert_eq!(config.interval().unwrap(), Duration::from_secs(3600));
    assert_eq!(config.command_timeout().unwrap(), Duration::from_secs(30));
    assert!(config.tags.is_empty());
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let mut config = Config {
        strategy: Strategy::Shell,
        interval: "20s".to_string(),
        error_policy: ErrorPolicy::FailFast,
        format: OutputFormat::Json,
        ..Default::default()
    };
    config.tags.insert("dc".to_string(), "eu-west".to_string());

    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_empty_file_is_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, "  \n").unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_invalid_files_are_rejected() {
    let temp_dir = TempDir::new().unwrap();

    let bad_json = temp_dir.path().join("bad.json");
    fs::write(&bad_json, "{ not json").unwrap();
    assert!(Config::load_from(&bad_json).is_err());

    let bad_interval = temp_dir.path().join("interval.json");
    fs::write(&bad_interval, r#"{"interval": "soon"}"#).unwrap();
    let err = Config::load_from(&bad_interval).unwrap_err();
    assert!(format!("{:#}", err).contains("soon"));

    let huge_interval = temp_dir.path().join("huge.json");
    fs::write(&huge_interval, r#"{"interval": "6000000000000000h"}"#).unwrap();
    assert!(Config::load_from(&huge_interval).is_err());

    let empty_tag = temp_dir.path().join("tags.json");
    fs::write(&empty_tag, r#"{"tags": {"site": ""}}"#).unwrap();
    assert!(Config::load_from(&empty_tag).is_err());

    let missing = temp_dir.path().join("missing.json");
    assert!(Config::load_from(&missing).is_err());
}

#[test]
fn test_collector_config_follows_flags() {
    let config: Config =
        serde_json::from_str(r#"{"os_version": false, "error_policy": "fail_fast"}"#).unwrap();
    let collector = config.collector_config();
    assert!(!collector.os_version);
    assert!(collector.update_history);
    assert_eq!(collector.error_policy, ErrorPolicy::FailFast);
}
