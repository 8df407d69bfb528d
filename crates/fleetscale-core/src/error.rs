//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
///
/// Every variant is fatal at startup: the daemon refuses to run with a
/// configuration that could oscillate or get stuck.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("service name must not start with '-': {0}")]
    InvalidServiceName(String),

    #[error("min_replicas must be at least 1")]
    ZeroMinReplicas,

    #[error("min_replicas ({min}) exceeds max_replicas ({max})")]
    InvertedBounds { min: u32, max: u32 },

    #[error("{name} must be a finite number, got {value}")]
    NonFiniteThreshold { name: &'static str, value: f64 },

    #[error("scale_down_threshold ({down}) must be below scale_up_threshold ({up})")]
    ThresholdsOverlap { up: f64, down: f64 },

    #[error("invalid duration for {field}: {value:?}")]
    InvalidDuration { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}
