use thiserror::Error;

/// Error type for the thermwatch library
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThermError {
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("Delivery to channel '{channel}' failed: {reason}")]
    DeliveryFailure { channel: String, reason: String },

    #[error("Fan actuation failed: {0}")]
    ActuationFailure(String),

    #[error("Engine error: {0}")]
    Engine(String),
}

/// Result type alias for thermwatch
pub type Result<T> = std::result::Result<T, ThermError>;

impl ThermError {
    /// Create a config validation error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ThermError::ConfigInvalid(msg.into())
    }

    pub fn delivery<C: Into<String>, R: Into<String>>(channel: C, reason: R) -> Self {
        ThermError::DeliveryFailure {
            channel: channel.into(),
            reason: reason.into(),
        }
    }

    pub fn actuation<S: Into<String>>(msg: S) -> Self {
        ThermError::ActuationFailure(msg.into())
    }

    pub fn engine<S: Into<String>>(msg: S) -> Self {
        ThermError::Engine(msg.into())
    }
}
