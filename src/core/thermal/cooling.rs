//! Cooling controller: maps severity onto a fan level and decides when the
//! actuator actually needs to be commanded.

use serde::{Deserialize, Serialize};

use super::types::{FanLevel, SeverityLevel};

/// Something that can set the fan level (GPIO pin, PWM, simulation).
pub trait FanActuator: Send {
    fn set_fan_level(&mut self, level: FanLevel) -> anyhow::Result<()>;

    fn name(&self) -> &str {
        "fan"
    }
}

/// Fan level for each severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanMapping {
    pub normal: FanLevel,
    pub high: FanLevel,
    pub critical: FanLevel,
}

impl Default for FanMapping {
    fn default() -> Self {
        Self {
            normal: FanLevel::Idle,
            high: FanLevel::High,
            critical: FanLevel::Critical,
        }
    }
}

impl FanMapping {
    pub fn level_for(&self, severity: SeverityLevel) -> FanLevel {
        match severity {
            SeverityLevel::Normal => self.normal,
            SeverityLevel::High => self.high,
            SeverityLevel::Critical => self.critical,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoolingController {
    mapping: FanMapping,
    last_commanded: Option<FanLevel>,
    fan_cycles: u64,
}

impl CoolingController {
    pub fn new(mapping: FanMapping) -> Self {
        Self {
            mapping,
            last_commanded: None,
            fan_cycles: 0,
        }
    }

    pub fn decide(&self, severity: SeverityLevel) -> FanLevel {
        self.mapping.level_for(severity)
    }

    /// True when `new_level` differs from what the actuator was last told.
    pub fn should_actuate(new_level: FanLevel, last_commanded: Option<FanLevel>) -> bool {
        last_commanded != Some(new_level)
    }

    pub fn needs_actuation(&self, new_level: FanLevel) -> bool {
        Self::should_actuate(new_level, self.last_commanded)
    }

    /// Record a successful actuation.
    pub fn commanded(&mut self, level: FanLevel) {
        let was_running = self.last_commanded.is_some_and(FanLevel::is_running);
        if level.is_running() && !was_running {
            self.fan_cycles += 1;
        }
        self.last_commanded = Some(level);
    }

    pub fn last_commanded(&self) -> Option<FanLevel> {
        self.last_commanded
    }

    /// Number of times the fan was switched on from idle
    pub fn fan_cycles(&self) -> u64 {
        self.fan_cycles
    }

    pub fn reset_fan_cycles(&mut self) {
        self.fan_cycles = 0;
    }
}
