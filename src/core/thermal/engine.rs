//! One sampling cycle of the temperature-state engine.
//!
//! `ThermalEngine` owns every piece of mutable state (severity, fan level,
//! cooldowns, statistics) and is driven by a single caller. A cycle runs to
//! completion before anything else can observe or change the engine, so a
//! cycle is atomic with respect to shutdown and readers.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::alerts::{AlertGate, AlertIntent, ChannelId, CooldownConfig};
use super::classifier::{classify, ThresholdConfig};
use super::cooling::{CoolingController, FanActuator, FanMapping};
use super::history::SharedHistory;
use super::sampler::{ReadError, SamplerAdapter, TemperatureSource};
use super::types::{
    EnginePhase, EngineSnapshot, EngineStats, FanLevel, Reading, Sample, SeverityLevel,
};
use crate::error::{Result, ThermError};

/// Settings the engine needs, extracted from the user configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub thresholds: ThresholdConfig,
    pub fan_mapping: FanMapping,
    pub cooldowns: CooldownConfig,
    pub sampling_interval: Duration,
    pub delivery_timeout: Duration,
    pub history_capacity: usize,
    pub fan_off_on_shutdown: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            fan_mapping: FanMapping::default(),
            cooldowns: CooldownConfig::default(),
            sampling_interval: Duration::from_secs(30),
            delivery_timeout: Duration::from_secs(10),
            history_capacity: super::history::DEFAULT_HISTORY_SIZE,
            fan_off_on_shutdown: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActuationOutcome {
    /// Level unchanged, actuator not called
    Skipped,
    Applied(FanLevel),
    Failed(String),
}

/// What happened during one cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub timestamp: DateTime<Utc>,
    pub phases: Vec<EnginePhase>,
    pub reading: std::result::Result<Reading, ReadError>,
    pub previous_severity: SeverityLevel,
    pub severity: SeverityLevel,
    pub fan_level: FanLevel,
    pub actuation: ActuationOutcome,
    pub intents: Vec<AlertIntent>,
}

impl CycleReport {
    pub fn is_degraded(&self) -> bool {
        self.reading.is_err()
    }
}

pub struct ThermalEngine {
    sampler: SamplerAdapter,
    actuator: Box<dyn FanActuator>,
    thresholds: ThresholdConfig,
    controller: CoolingController,
    gate: AlertGate,
    channels: Vec<ChannelId>,
    history: SharedHistory,
    severity: SeverityLevel,
    fan_level: FanLevel,
    last_reading: Option<Reading>,
    last_sample_time: Option<DateTime<Utc>>,
    phase: EnginePhase,
    degraded: bool,
    fan_off_on_shutdown: bool,
    stats: EngineStats,
}

impl ThermalEngine {
    /// Build an engine. Fails with `ConfigInvalid` when the threshold bands overlap.
    pub fn new(
        settings: &EngineSettings,
        source: Box<dyn TemperatureSource>,
        actuator: Box<dyn FanActuator>,
        channels: Vec<ChannelId>,
    ) -> Result<Self> {
        settings.thresholds.validate()?;

        Ok(Self {
            sampler: SamplerAdapter::new(source),
            actuator,
            thresholds: settings.thresholds,
            controller: CoolingController::new(settings.fan_mapping),
            gate: AlertGate::new(settings.cooldowns, settings.thresholds),
            channels,
            history: SharedHistory::new(settings.history_capacity),
            severity: SeverityLevel::Normal,
            fan_level: FanLevel::Idle,
            last_reading: None,
            last_sample_time: None,
            phase: EnginePhase::Idle,
            degraded: false,
            fan_off_on_shutdown: settings.fan_off_on_shutdown,
            stats: EngineStats::new(Utc::now()),
        })
    }

    pub fn history(&self) -> SharedHistory {
        self.history.clone()
    }

    pub fn severity(&self) -> SeverityLevel {
        self.severity
    }

    pub fn fan_level(&self) -> FanLevel {
        self.fan_level
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    fn enter(&mut self, phase: EnginePhase, phases: &mut Vec<EnginePhase>) {
        log::trace!("Engine phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        phases.push(phase);
    }

    /// Run one full cycle: sample, classify, actuate, record, alert.
    ///
    /// Never fails; collaborator errors are logged, counted and reported.
    pub fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let mut phases = Vec::with_capacity(5);
        let previous_severity = self.severity;

        self.enter(EnginePhase::Sampling, &mut phases);
        let reading = self.sampler.sample(now);

        let (actuation, intents) = match &reading {
            Err(e) => {
                self.enter(EnginePhase::Degraded, &mut phases);
                log::warn!("Degraded cycle, keeping {} state: {}", self.severity, e);
                self.degraded = true;
                self.stats.degraded_cycles += 1;

                let last_temperature = self.last_reading.map(|r| r.temperature);
                self.record(Sample::degraded(
                    now,
                    last_temperature,
                    self.severity,
                    self.fan_level,
                ));
                (ActuationOutcome::Skipped, Vec::new())
            }
            Ok(reading) => {
                let reading = *reading;
                self.degraded = false;

                self.enter(EnginePhase::Classifying, &mut phases);
                self.severity = classify(reading.temperature, previous_severity, &self.thresholds);
                if self.severity != previous_severity {
                    log::info!(
                        "Temperature state {} -> {} at {:.1}°C",
                        previous_severity,
                        self.severity,
                        reading.temperature
                    );
                }

                self.enter(EnginePhase::Actuating, &mut phases);
                let actuation = self.actuate();

                self.last_reading = Some(reading);
                self.stats.record_temperature(reading.temperature);
                self.record(Sample::from_reading(&reading, self.severity, self.fan_level));

                self.enter(EnginePhase::Alerting, &mut phases);
                let intents =
                    self.gate
                        .evaluate(self.severity, reading.temperature, now, &self.channels);
                if !intents.is_empty() {
                    log::warn!("{}", intents[0].message);
                }
                self.stats.alerts_triggered += intents.len() as u64;

                (actuation, intents)
            }
        };

        self.enter(EnginePhase::Idle, &mut phases);
        self.stats.cycles += 1;

        CycleReport {
            timestamp: now,
            phases,
            reading,
            previous_severity,
            severity: self.severity,
            fan_level: self.fan_level,
            actuation,
            intents,
        }
    }

    fn actuate(&mut self) -> ActuationOutcome {
        let level = self.controller.decide(self.severity);
        self.fan_level = level;

        if !self.controller.needs_actuation(level) {
            return ActuationOutcome::Skipped;
        }

        match self.actuator.set_fan_level(level) {
            Ok(()) => {
                log::info!("Fan set to {} ({})", level, self.actuator.name());
                self.controller.commanded(level);
                self.stats.fan_cycles = self.controller.fan_cycles();
                ActuationOutcome::Applied(level)
            }
            Err(e) => {
                let err = ThermError::actuation(format!("{} ({:#})", level, e));
                log::error!("{}", err);
                self.stats.actuation_failures += 1;
                ActuationOutcome::Failed(err.to_string())
            }
        }
    }

    fn record(&mut self, sample: Sample) {
        self.history.append(sample);
        self.last_sample_time = Some(sample.timestamp);
    }

    /// Start the cooldown for a delivered intent, measured from its emission time.
    pub fn confirm_delivery(&mut self, intent: &AlertIntent) {
        log::info!("Alert {} delivered via {}", intent.id, intent.channel);
        self.gate.confirm_delivery(intent, intent.created_at);
        self.stats.alerts_delivered += 1;
    }

    pub fn delivery_failed(&mut self, intent: &AlertIntent, reason: &str) {
        let err = ThermError::delivery(intent.channel.as_str(), reason);
        log::warn!("Alert {}: {}", intent.id, err);
        self.gate.delivery_failed(intent);
        self.stats.delivery_failures += 1;
    }

    pub fn reset_stats(&mut self, now: DateTime<Utc>) {
        log::info!("Statistics reset");
        self.stats = EngineStats::new(now);
        self.controller.reset_fan_cycles();
    }

    /// Consistent copy of the current state
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            severity: self.severity,
            fan_level: self.fan_level,
            commanded_fan_level: self.controller.last_commanded(),
            last_reading: self.last_reading.map(|r| r.temperature),
            last_sample_time: self.last_sample_time,
            phase: self.phase,
            degraded: self.degraded,
            history_len: self.history.len(),
            stats: self.stats.clone(),
        }
    }

    /// Stop the engine, switching the fan off if configured to.
    pub fn shutdown(&mut self) {
        if self.fan_off_on_shutdown && self.controller.needs_actuation(FanLevel::Idle) {
            match self.actuator.set_fan_level(FanLevel::Idle) {
                Ok(()) => {
                    log::info!("Fan turned off during shutdown");
                    self.controller.commanded(FanLevel::Idle);
                    self.fan_level = FanLevel::Idle;
                }
                Err(e) => log::error!("Failed to turn fan off during shutdown: {:#}", e),
            }
        }
        self.phase = EnginePhase::Stopped;
    }
}
