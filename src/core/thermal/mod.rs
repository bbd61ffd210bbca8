//! Temperature-state engine.
//!
//! Samples a temperature source, classifies it into a severity with
//! hysteresis, drives the fan, keeps a bounded history and rate-limits
//! alerts per channel.

pub mod alerts;
pub mod classifier;
pub mod cooling;
pub mod delivery;
pub mod engine;
pub mod history;
pub mod runtime;
pub mod sampler;
mod types;

pub use alerts::{AlertGate, AlertIntent, ChannelId, CooldownConfig};
pub use classifier::{classify, ThresholdConfig};
pub use cooling::{CoolingController, FanActuator, FanMapping};
pub use delivery::{deliver_with_timeout, DeliveryOutcome, NotificationSink};
pub use engine::{ActuationOutcome, CycleReport, EngineSettings, ThermalEngine};
pub use history::{Aggregate, HistoryRing, SharedHistory, Window};
pub use runtime::{EngineCommand, EngineHandle, EngineRuntime};
pub use sampler::{ReadError, SamplerAdapter, TemperatureSource};
pub use types::{
    EnginePhase, EngineSnapshot, EngineStats, FanLevel, Reading, Sample, SeverityLevel,
};
