//! Threshold classifier with hysteresis bands.
//!
//! Maps a temperature and the previous severity onto a new [`SeverityLevel`].
//! Each level has an enter threshold and a lower exit threshold; a level is
//! only left once the temperature drops below its exit threshold.

use serde::{Deserialize, Serialize};

use super::types::SeverityLevel;
use crate::error::{Result, ThermError};

/// Hysteresis bands in °C.
///
/// Invariant: `high_exit < high_enter <= critical_exit < critical_enter`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub high_enter: f32,
    pub high_exit: f32,
    pub critical_enter: f32,
    pub critical_exit: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high_enter: 70.0,
            high_exit: 65.0,
            critical_enter: 80.0,
            critical_exit: 75.0,
        }
    }
}

impl ThresholdConfig {
    pub fn new(high_enter: f32, high_exit: f32, critical_enter: f32, critical_exit: f32) -> Result<Self> {
        let config = Self {
            high_enter,
            high_exit,
            critical_enter,
            critical_exit,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let values = [
            self.high_enter,
            self.high_exit,
            self.critical_enter,
            self.critical_exit,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ThermError::config("thresholds must be finite numbers"));
        }
        if self.high_exit >= self.high_enter {
            return Err(ThermError::config(format!(
                "high exit ({:.1}°C) must be below high enter ({:.1}°C)",
                self.high_exit, self.high_enter
            )));
        }
        if self.high_enter > self.critical_exit {
            return Err(ThermError::config(format!(
                "high enter ({:.1}°C) must not exceed critical exit ({:.1}°C)",
                self.high_enter, self.critical_exit
            )));
        }
        if self.critical_exit >= self.critical_enter {
            return Err(ThermError::config(format!(
                "critical exit ({:.1}°C) must be below critical enter ({:.1}°C)",
                self.critical_exit, self.critical_enter
            )));
        }
        Ok(())
    }

    /// Enter threshold of a level, if it has one
    pub fn enter_threshold(&self, severity: SeverityLevel) -> Option<f32> {
        match severity {
            SeverityLevel::Normal => None,
            SeverityLevel::High => Some(self.high_enter),
            SeverityLevel::Critical => Some(self.critical_enter),
        }
    }
}

/// Classify a temperature given the previous severity.
pub fn classify(temperature: f32, previous: SeverityLevel, config: &ThresholdConfig) -> SeverityLevel {
    if (previous == SeverityLevel::Critical && temperature >= config.critical_exit)
        || temperature >= config.critical_enter
    {
        return SeverityLevel::Critical;
    }

    // leaving Critical steps down through High, never straight to Normal
    if (previous >= SeverityLevel::High && temperature >= config.high_exit)
        || temperature >= config.high_enter
    {
        return SeverityLevel::High;
    }

    SeverityLevel::Normal
}
