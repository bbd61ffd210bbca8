//! Alert gate: rate-limits outbound alerts per (severity, channel).
//!
//! An intent is emitted for a channel when the severity is High or Critical and
//! either nothing was delivered yet for that pair or its cooldown has elapsed.
//! Cooldowns only start on confirmed delivery, so a failed send is retried on
//! the next qualifying sample. Returning to Normal clears all cooldowns.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::ThresholdConfig;
use super::types::SeverityLevel;

/// Name of a notification channel ("log", "webhook", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new<S: Into<String>>(name: S) -> Self {
        ChannelId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cooldown configuration (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub high_secs: u64,
    pub critical_secs: u64,
    /// Clear cooldowns when severity returns to Normal
    pub reset_on_normal: bool,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            high_secs: 900,
            critical_secs: 300,
            reset_on_normal: true,
        }
    }
}

/// Longest cooldown accepted from configuration (one week)
pub const MAX_COOLDOWN_SECS: u64 = 7 * 24 * 3600;

impl CooldownConfig {
    /// Cooldown for a severity. Values beyond chrono's range saturate instead of wrapping.
    pub fn cooldown(&self, severity: SeverityLevel) -> Duration {
        let secs = match severity {
            SeverityLevel::Normal => 0,
            SeverityLevel::High => self.high_secs,
            SeverityLevel::Critical => self.critical_secs,
        };
        i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }
}

/// An alert that should be delivered to one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertIntent {
    pub id: u64,
    pub severity: SeverityLevel,
    pub channel: ChannelId,
    pub message: String,
    pub temperature: f32,
    pub threshold: Option<f32>,
    pub created_at: DateTime<Utc>,
    /// Increments every time cooldowns are reset
    pub episode: u64,
}

type GateKey = (SeverityLevel, ChannelId);

#[derive(Debug, Clone)]
pub struct AlertGate {
    cooldowns: CooldownConfig,
    thresholds: ThresholdConfig,
    last_emission: HashMap<GateKey, DateTime<Utc>>,
    in_flight: HashMap<GateKey, u64>,
    episode: u64,
    next_id: u64,
}

impl AlertGate {
    pub fn new(cooldowns: CooldownConfig, thresholds: ThresholdConfig) -> Self {
        Self {
            cooldowns,
            thresholds,
            last_emission: HashMap::new(),
            in_flight: HashMap::new(),
            episode: 0,
            next_id: 1,
        }
    }

    pub fn last_emission(&self, severity: SeverityLevel, channel: &ChannelId) -> Option<DateTime<Utc>> {
        self.last_emission
            .get(&(severity, channel.clone()))
            .copied()
    }

    pub fn is_in_flight(&self, severity: SeverityLevel, channel: &ChannelId) -> bool {
        self.in_flight.contains_key(&(severity, channel.clone()))
    }

    /// Decide which channels should be alerted for this sample.
    ///
    /// Returned intents are marked in flight until [`confirm_delivery`] or
    /// [`delivery_failed`] is called for them.
    ///
    /// [`confirm_delivery`]: AlertGate::confirm_delivery
    /// [`delivery_failed`]: AlertGate::delivery_failed
    pub fn evaluate(
        &mut self,
        severity: SeverityLevel,
        temperature: f32,
        now: DateTime<Utc>,
        channels: &[ChannelId],
    ) -> Vec<AlertIntent> {
        if !severity.is_alerting() {
            if self.cooldowns.reset_on_normal {
                self.reset();
            }
            return Vec::new();
        }

        let cooldown = self.cooldowns.cooldown(severity);
        let mut intents = Vec::new();

        for channel in channels {
            let key = (severity, channel.clone());

            if self.in_flight.contains_key(&key) {
                continue;
            }

            let ready = match self.last_emission.get(&key) {
                None => true,
                Some(&last) => now - last >= cooldown,
            };
            if !ready {
                continue;
            }

            let intent = self.build_intent(severity, temperature, now, channel.clone());
            self.in_flight.insert(key, intent.id);
            intents.push(intent);
        }

        intents
    }

    /// Record a confirmed delivery; starts the cooldown for the pair.
    pub fn confirm_delivery(&mut self, intent: &AlertIntent, now: DateTime<Utc>) {
        let key = (intent.severity, intent.channel.clone());
        self.release(&key, intent.id);

        if intent.episode != self.episode {
            log::debug!(
                "Ignoring confirmation of alert {} from a previous episode",
                intent.id
            );
            return;
        }
        self.last_emission.insert(key, now);
    }

    /// Record a failed delivery. Cooldown state is left untouched.
    pub fn delivery_failed(&mut self, intent: &AlertIntent) {
        let key = (intent.severity, intent.channel.clone());
        self.release(&key, intent.id);
    }

    /// Clear all cooldowns and pending deliveries and start a new episode
    pub fn reset(&mut self) {
        if self.last_emission.is_empty() && self.in_flight.is_empty() {
            return;
        }
        log::debug!("Temperature back to normal, clearing alert cooldowns");
        self.last_emission.clear();
        self.in_flight.clear();
        self.episode += 1;
    }

    fn release(&mut self, key: &GateKey, id: u64) {
        if self.in_flight.get(key) == Some(&id) {
            self.in_flight.remove(key);
        }
    }

    fn build_intent(
        &mut self,
        severity: SeverityLevel,
        temperature: f32,
        now: DateTime<Utc>,
        channel: ChannelId,
    ) -> AlertIntent {
        let threshold = self.thresholds.enter_threshold(severity);
        let message = match threshold {
            Some(t) => format!(
                "{} TEMPERATURE ALERT: {:.1}°C (threshold: {:.1}°C)",
                severity.label(),
                temperature,
                t
            ),
            None => format!("{} temperature: {:.1}°C", severity.label(), temperature),
        };

        let id = self.next_id;
        self.next_id += 1;

        AlertIntent {
            id,
            severity,
            channel,
            message,
            temperature,
            threshold,
            created_at: now,
            episode: self.episode,
        }
    }
}
