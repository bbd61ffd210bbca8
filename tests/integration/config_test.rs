use std::fs;
use std::time::Duration;

use tempfile::TempDir;
use thermwatch::core::config::{ChannelKind, Config, SensorKind};
use thermwatch::ThermError;

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("thermwatch").join("config.json");

    let mut config = Config::default();
    config.set_value("thresholds.high_enter", "72").unwrap();
    config.set_value("log_interval", "10").unwrap();
    config.set_value("sensor.kind", "sysinfo").unwrap();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.thresholds.high_enter, 72.0);
    assert_eq!(loaded.log_interval, 10);
    assert_eq!(loaded.sensor.kind, SensorKind::Sysinfo);
    assert_eq!(loaded.alerts.channels.len(), 1);
    assert!(matches!(loaded.alerts.channels[0].kind, ChannelKind::Log));
}

#[test]
fn test_missing_and_empty_files_yield_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    let missing = Config::load_from(&path).unwrap();
    assert_eq!(missing.log_interval, 30);

    fs::write(&path, "  \n").unwrap();
    let empty = Config::load_from(&path).unwrap();
    assert_eq!(empty.data_retention_hours, 24);
}

#[test]
fn test_corrupt_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_webhook_channel_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "alerts": {
                "channels": [
                    { "name": "ops", "type": "webhook", "url": "https://hooks.example.com/T000" },
                    { "name": "desk", "type": "command", "program": "notify-send" }
                ]
            }
        }"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert!(config.validate().is_ok());
    match &config.alerts.channels[0].kind {
        ChannelKind::Webhook { url } => assert_eq!(url, "https://hooks.example.com/T000"),
        other => panic!("unexpected channel {:?}", other),
    }
    match &config.alerts.channels[1].kind {
        ChannelKind::Command { program, args } => {
            assert_eq!(program, "notify-send");
            assert!(args.is_empty());
        }
        other => panic!("unexpected channel {:?}", other),
    }
}

#[test]
fn test_engine_settings_follow_config() {
    let mut config = Config::default();
    config.log_interval = 60;
    config.data_retention_hours = 2;

    let settings = config.engine_settings().unwrap();
    assert_eq!(settings.sampling_interval, Duration::from_secs(60));
    assert_eq!(settings.history_capacity, 120);
    assert_eq!(settings.delivery_timeout, Duration::from_millis(10_000));
}

#[test]
fn test_invalid_bands_rejected_at_load() {
    let mut config = Config::default();
    config.set_value("thresholds.high_exit", "71").unwrap();

    assert!(matches!(config.validate(), Err(ThermError::ConfigInvalid(_))));
    assert!(config.engine_settings().is_err());
}

#[test]
fn test_oversized_cooldowns_rejected() {
    for value in ["10000000000000000", "18446744073709551615"] {
        let mut config = Config::default();
        config.set_value("alerts.cooldowns.high_secs", value).unwrap();
        assert!(matches!(config.validate(), Err(ThermError::ConfigInvalid(_))));
        assert!(config.engine_settings().is_err());
    }

    let mut config = Config::default();
    config.set_value("alerts.cooldowns.critical_secs", "604800").unwrap();
    assert!(config.validate().is_ok());
    config.set_value("alerts.cooldowns.critical_secs", "604801").unwrap();
    assert!(config.validate().is_err());
}
