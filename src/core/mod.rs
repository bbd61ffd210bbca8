// Core business logic module

pub mod config;
pub mod thermal;

// Re-export commonly used items
pub use config::Config;
pub use thermal::{EngineHandle, EngineRuntime, EngineSettings, ThermalEngine};
