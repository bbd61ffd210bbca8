//! Sampler adapter around a pluggable temperature source.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::types::Reading;

/// A source of raw temperature readings in °C.
///
/// Implementations may fail for any reason; the adapter folds every failure
/// into [`ReadError::SensorUnavailable`].
pub trait TemperatureSource: Send {
    fn read_celsius(&mut self) -> anyhow::Result<f32>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "sensor"
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),
}

impl From<ReadError> for crate::error::ThermError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::SensorUnavailable(msg) => crate::error::ThermError::SensorUnavailable(msg),
        }
    }
}

pub struct SamplerAdapter {
    source: Box<dyn TemperatureSource>,
}

impl SamplerAdapter {
    pub fn new(source: Box<dyn TemperatureSource>) -> Self {
        Self { source }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Take one reading. Never retries.
    pub fn sample(&mut self, now: DateTime<Utc>) -> Result<Reading, ReadError> {
        match self.source.read_celsius() {
            Ok(temperature) if temperature.is_finite() => Ok(Reading {
                timestamp: now,
                temperature,
                valid: true,
            }),
            Ok(temperature) => Err(ReadError::SensorUnavailable(format!(
                "{} returned non-finite value {}",
                self.source.name(),
                temperature
            ))),
            Err(e) => Err(ReadError::SensorUnavailable(format!(
                "{}: {:#}",
                self.source.name(),
                e
            ))),
        }
    }
}
