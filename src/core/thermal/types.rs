use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered severity of the current thermal state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    #[default]
    Normal,
    High,
    Critical,
}

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 3] = [
        SeverityLevel::Normal,
        SeverityLevel::High,
        SeverityLevel::Critical,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SeverityLevel::Normal => "NORMAL",
            SeverityLevel::High => "HIGH",
            SeverityLevel::Critical => "CRITICAL",
        }
    }

    /// Whether this level is eligible for alerting
    pub fn is_alerting(self) -> bool {
        self > SeverityLevel::Normal
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Commanded fan level. `Idle` is the floor (fan off).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FanLevel {
    #[default]
    Idle,
    Normal,
    High,
    Critical,
}

impl FanLevel {
    pub fn is_running(self) -> bool {
        self != FanLevel::Idle
    }

    pub fn label(self) -> &'static str {
        match self {
            FanLevel::Idle => "OFF",
            FanLevel::Normal => "LOW",
            FanLevel::High => "HIGH",
            FanLevel::Critical => "MAX",
        }
    }
}

impl fmt::Display for FanLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single temperature reading produced by the sampler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub temperature: f32, // °C
    pub valid: bool,
}

/// One history record. Degraded samples mark cycles where the sensor could not be read;
/// they carry the last known temperature, if any.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f32>,
    pub severity: SeverityLevel,
    pub fan_level: FanLevel,
    pub degraded: bool,
}

impl Sample {
    pub fn from_reading(reading: &Reading, severity: SeverityLevel, fan_level: FanLevel) -> Self {
        Self {
            timestamp: reading.timestamp,
            temperature: Some(reading.temperature),
            severity,
            fan_level,
            degraded: false,
        }
    }

    pub fn degraded(
        timestamp: DateTime<Utc>,
        last_temperature: Option<f32>,
        severity: SeverityLevel,
        fan_level: FanLevel,
    ) -> Self {
        Self {
            timestamp,
            temperature: last_temperature,
            severity,
            fan_level,
            degraded: true,
        }
    }

    /// Temperature of a valid (non-degraded) sample
    pub fn valid_temperature(&self) -> Option<f32> {
        if self.degraded {
            None
        } else {
            self.temperature
        }
    }
}

/// Phase of the engine's sampling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePhase {
    #[default]
    Idle,
    Sampling,
    Classifying,
    Actuating,
    Alerting,
    Degraded,
    Stopped,
}

/// Running counters, reset on request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub started_at: DateTime<Utc>,
    pub cycles: u64,
    pub degraded_cycles: u64,
    pub fan_cycles: u64,
    pub min_temp: Option<f32>,
    pub max_temp: Option<f32>,
    pub alerts_triggered: u64,
    pub alerts_delivered: u64,
    pub delivery_failures: u64,
    pub actuation_failures: u64,
}

impl EngineStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            cycles: 0,
            degraded_cycles: 0,
            fan_cycles: 0,
            min_temp: None,
            max_temp: None,
            alerts_triggered: 0,
            alerts_delivered: 0,
            delivery_failures: 0,
            actuation_failures: 0,
        }
    }

    pub fn record_temperature(&mut self, temperature: f32) {
        self.min_temp = Some(self.min_temp.map_or(temperature, |m| m.min(temperature)));
        self.max_temp = Some(self.max_temp.map_or(temperature, |m| m.max(temperature)));
    }
}

/// Consistent view of the engine state published after every cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub severity: SeverityLevel,
    pub fan_level: FanLevel,
    pub commanded_fan_level: Option<FanLevel>,
    pub last_reading: Option<f32>,
    pub last_sample_time: Option<DateTime<Utc>>,
    pub phase: EnginePhase,
    pub degraded: bool,
    pub history_len: usize,
    pub stats: EngineStats,
}
