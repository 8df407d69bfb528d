//! Shared types used across fleetscale crates.
//!
//! These are the validated, immutable inputs of the control loop. Each one
//! can only be built through a constructor that enforces its invariant, so
//! downstream code never re-checks them.

use std::fmt;

use crate::error::{ConfigError, ConfigResult};

/// Name of the service being scaled, as understood by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceTarget(String);

impl ServiceTarget {
    pub fn new(name: impl Into<String>) -> ConfigResult<Self> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }
        // Would be read as a flag by the orchestrator CLI.
        if name.starts_with('-') {
            return Err(ConfigError::InvalidServiceName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hard floor and ceiling on the replica count.
///
/// Invariant: `1 <= min_replicas <= max_replicas`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingBounds {
    min_replicas: u32,
    max_replicas: u32,
}

impl ScalingBounds {
    pub fn new(min_replicas: u32, max_replicas: u32) -> ConfigResult<Self> {
        if min_replicas == 0 {
            return Err(ConfigError::ZeroMinReplicas);
        }
        if min_replicas > max_replicas {
            return Err(ConfigError::InvertedBounds {
                min: min_replicas,
                max: max_replicas,
            });
        }
        Ok(Self {
            min_replicas,
            max_replicas,
        })
    }

    pub fn min_replicas(&self) -> u32 {
        self.min_replicas
    }

    pub fn max_replicas(&self) -> u32 {
        self.max_replicas
    }

    pub fn contains(&self, replicas: u32) -> bool {
        (self.min_replicas..=self.max_replicas).contains(&replicas)
    }

    /// Bring an arbitrary count into `[min_replicas, max_replicas]`.
    pub fn clamp(&self, replicas: u32) -> u32 {
        replicas.clamp(self.min_replicas, self.max_replicas)
    }
}

/// Utilization percentages that trigger a scale step.
///
/// Invariant: both finite and `scale_down < scale_up`. The band between the
/// two is the hysteresis dead zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingThresholds {
    scale_up: f64,
    scale_down: f64,
}

impl ScalingThresholds {
    pub fn new(scale_up: f64, scale_down: f64) -> ConfigResult<Self> {
        if !scale_up.is_finite() {
            return Err(ConfigError::NonFiniteThreshold {
                name: "scale_up_threshold",
                value: scale_up,
            });
        }
        if !scale_down.is_finite() {
            return Err(ConfigError::NonFiniteThreshold {
                name: "scale_down_threshold",
                value: scale_down,
            });
        }
        if scale_down >= scale_up {
            return Err(ConfigError::ThresholdsOverlap {
                up: scale_up,
                down: scale_down,
            });
        }
        Ok(Self {
            scale_up,
            scale_down,
        })
    }

    pub fn scale_up(&self) -> f64 {
        self.scale_up
    }

    pub fn scale_down(&self) -> f64 {
        self.scale_down
    }

    /// Whether `utilization` falls strictly inside the dead zone.
    pub fn in_dead_zone(&self, utilization: f64) -> bool {
        utilization > self.scale_down && utilization < self.scale_up
    }
}
