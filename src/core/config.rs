use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::thermal::alerts::MAX_COOLDOWN_SECS;
use crate::core::thermal::{CooldownConfig, EngineSettings, FanMapping, ThresholdConfig};
use crate::error::ThermError;
use crate::platform::sinks::parse_webhook_url;

pub const MIN_LOG_INTERVAL_SECS: u64 = 5;
pub const MAX_LOG_INTERVAL_SECS: u64 = 300;
pub const MAX_RETENTION_HOURS: u64 = 168;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// vcgencmd when available, otherwise thermal zone
    #[default]
    Auto,
    Vcgencmd,
    ThermalZone,
    Sysinfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub kind: SensorKind,
    pub zone: u32,
    /// Component label filter for the sysinfo sensor
    pub label: Option<String>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: SensorKind::Auto,
            zone: 0,
            label: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    #[default]
    Simulated,
    Gpio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanConfig {
    pub actuator: ActuatorKind,
    pub pin: u8,
    pub mapping: FanMapping,
    pub off_on_shutdown: bool,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            actuator: ActuatorKind::Simulated,
            pin: 14,
            mapping: FanMapping::default(),
            off_on_shutdown: true,
        }
    }
}

/// Delivery mechanism of a notification channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelKind {
    Log,
    Webhook { url: String },
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: ChannelKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub cooldowns: CooldownConfig,
    pub delivery_timeout_ms: u64,
    pub channels: Vec<ChannelConfig>,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            cooldowns: CooldownConfig::default(),
            delivery_timeout_ms: 10_000,
            channels: vec![ChannelConfig {
                name: "log".to_string(),
                kind: ChannelKind::Log,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub thresholds: ThresholdConfig,
    /// Seconds between samples
    pub log_interval: u64,
    pub data_retention_hours: u64,
    pub sensor: SensorConfig,
    pub fan: FanConfig,
    pub alerts: AlertsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            log_interval: 30,
            data_retention_hours: 24,
            sensor: SensorConfig::default(),
            fan: FanConfig::default(),
            alerts: AlertsConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default location; a missing or empty file yields defaults.
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if data.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_json::from_str(&data).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::get_config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, data).with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("thermwatch").join("config.json"))
    }

    /// Check every setting; fails with `ConfigInvalid`.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.thresholds.validate()?;

        if !(MIN_LOG_INTERVAL_SECS..=MAX_LOG_INTERVAL_SECS).contains(&self.log_interval) {
            return Err(ThermError::config(format!(
                "log interval must be between {} and {} seconds (got {})",
                MIN_LOG_INTERVAL_SECS, MAX_LOG_INTERVAL_SECS, self.log_interval
            )));
        }

        if !(1..=MAX_RETENTION_HOURS).contains(&self.data_retention_hours) {
            return Err(ThermError::config(format!(
                "data retention must be between 1 and {} hours (got {})",
                MAX_RETENTION_HOURS, self.data_retention_hours
            )));
        }

        if self.fan.pin < 1 || self.fan.pin > 40 {
            return Err(ThermError::config(format!(
                "fan pin must be between 1 and 40 (got {})",
                self.fan.pin
            )));
        }

        let cooldowns = &self.alerts.cooldowns;
        for (name, secs) in [("high", cooldowns.high_secs), ("critical", cooldowns.critical_secs)] {
            if secs > MAX_COOLDOWN_SECS {
                return Err(ThermError::config(format!(
                    "{} alert cooldown must be at most {} seconds (got {})",
                    name, MAX_COOLDOWN_SECS, secs
                )));
            }
        }

        if self.alerts.delivery_timeout_ms == 0 {
            return Err(ThermError::config("delivery timeout must be greater than zero"));
        }

        let mut names = std::collections::HashSet::new();
        for channel in &self.alerts.channels {
            if channel.name.trim().is_empty() {
                return Err(ThermError::config("channel names must not be empty"));
            }
            if !names.insert(channel.name.as_str()) {
                return Err(ThermError::config(format!(
                    "duplicate channel name '{}'",
                    channel.name
                )));
            }
            match &channel.kind {
                ChannelKind::Webhook { url } => {
                    parse_webhook_url(url).map_err(|e| ThermError::config(format!("{:#}", e)))?;
                }
                ChannelKind::Command { program, .. } if program.trim().is_empty() => {
                    return Err(ThermError::config(format!(
                        "channel '{}' has an empty command",
                        channel.name
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Number of samples covering the retention window
    pub fn history_capacity(&self) -> usize {
        let interval = self.log_interval.max(1);
        ((self.data_retention_hours * 3600) / interval).max(1) as usize
    }

    /// Validated engine settings
    pub fn engine_settings(&self) -> crate::error::Result<EngineSettings> {
        self.validate()?;

        Ok(EngineSettings {
            thresholds: self.thresholds,
            fan_mapping: self.fan.mapping,
            cooldowns: self.alerts.cooldowns,
            sampling_interval: Duration::from_secs(self.log_interval),
            delivery_timeout: Duration::from_millis(self.alerts.delivery_timeout_ms),
            history_capacity: self.history_capacity(),
            fan_off_on_shutdown: self.fan.off_on_shutdown,
        })
    }

    /// Set a single value by dotted key, e.g. `thresholds.high_enter`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        fn num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| anyhow::anyhow!("Invalid value '{}' for {}", value, key))
        }

        match key {
            "thresholds.high_enter" => self.thresholds.high_enter = num(key, value)?,
            "thresholds.high_exit" => self.thresholds.high_exit = num(key, value)?,
            "thresholds.critical_enter" => self.thresholds.critical_enter = num(key, value)?,
            "thresholds.critical_exit" => self.thresholds.critical_exit = num(key, value)?,
            "log_interval" => self.log_interval = num(key, value)?,
            "data_retention_hours" => self.data_retention_hours = num(key, value)?,
            "fan.pin" => self.fan.pin = num(key, value)?,
            "fan.off_on_shutdown" => self.fan.off_on_shutdown = num(key, value)?,
            "fan.actuator" => {
                self.fan.actuator = match value.trim() {
                    "simulated" => ActuatorKind::Simulated,
                    "gpio" => ActuatorKind::Gpio,
                    other => bail!("Unknown actuator '{}' (use simulated or gpio)", other),
                }
            }
            "sensor.kind" => {
                self.sensor.kind = match value.trim() {
                    "auto" => SensorKind::Auto,
                    "vcgencmd" => SensorKind::Vcgencmd,
                    "thermal_zone" => SensorKind::ThermalZone,
                    "sysinfo" => SensorKind::Sysinfo,
                    other => bail!(
                        "Unknown sensor '{}' (use auto, vcgencmd, thermal_zone or sysinfo)",
                        other
                    ),
                }
            }
            "sensor.zone" => self.sensor.zone = num(key, value)?,
            "alerts.delivery_timeout_ms" => self.alerts.delivery_timeout_ms = num(key, value)?,
            "alerts.cooldowns.high_secs" => self.alerts.cooldowns.high_secs = num(key, value)?,
            "alerts.cooldowns.critical_secs" => {
                self.alerts.cooldowns.critical_secs = num(key, value)?
            }
            "alerts.cooldowns.reset_on_normal" => {
                self.alerts.cooldowns.reset_on_normal = num(key, value)?
            }
            _ => bail!("Unknown configuration key '{}'", key),
        }

        Ok(())
    }
}
