// Shared test doubles for the thermal engine

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use thermwatch::core::thermal::{
    AlertIntent, EngineSettings, FanActuator, FanLevel, NotificationSink, TemperatureSource,
    ThresholdConfig,
};

/// Replays a script of readings; `None` is a sensor failure. Repeats the last
/// entry once the script is exhausted.
pub struct ScriptedSource {
    script: VecDeque<Option<f32>>,
    last: Option<f32>,
}

impl ScriptedSource {
    pub fn new(readings: &[Option<f32>]) -> Self {
        Self {
            script: readings.iter().copied().collect(),
            last: None,
        }
    }
}

impl TemperatureSource for ScriptedSource {
    fn read_celsius(&mut self) -> anyhow::Result<f32> {
        let next = match self.script.pop_front() {
            Some(entry) => {
                self.last = entry;
                entry
            }
            None => self.last,
        };
        next.ok_or_else(|| anyhow::anyhow!("sensor offline"))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Clone, Default)]
pub struct RecordingFan {
    pub commands: Arc<Mutex<Vec<FanLevel>>>,
}

impl FanActuator for RecordingFan {
    fn set_fan_level(&mut self, level: FanLevel) -> anyhow::Result<()> {
        self.commands.lock().push(level);
        Ok(())
    }
}

/// Sink that records deliveries and fails the first `failures` attempts
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub delivered: Arc<Mutex<Vec<AlertIntent>>>,
    pub failures: Arc<Mutex<usize>>,
}

impl RecordingSink {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures: Arc::new(Mutex::new(failures)),
            ..Default::default()
        }
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, intent: &AlertIntent) -> anyhow::Result<()> {
        let mut failures = self.failures.lock();
        if *failures > 0 {
            *failures -= 1;
            anyhow::bail!("smtp unreachable");
        }
        self.delivered.lock().push(intent.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn bands() -> ThresholdConfig {
    ThresholdConfig::new(45.0, 42.0, 50.0, 47.0).unwrap()
}

pub fn settings() -> EngineSettings {
    EngineSettings {
        thresholds: bands(),
        sampling_interval: Duration::from_secs(30),
        history_capacity: 32,
        ..Default::default()
    }
}

/// Sink that blocks longer than any test delivery timeout
#[derive(Clone, Default)]
pub struct HangingSink {
    pub attempts: Arc<Mutex<usize>>,
}

impl NotificationSink for HangingSink {
    fn deliver(&self, _intent: &AlertIntent) -> anyhow::Result<()> {
        *self.attempts.lock() += 1;
        std::thread::sleep(Duration::from_millis(300));
        Ok(())
    }
}
