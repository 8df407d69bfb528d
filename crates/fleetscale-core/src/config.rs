//! fleetscale.toml configuration parser.
//!
//! The file is read once at startup and never reloaded. Every field has a
//! default, so an absent file yields the stock single-service setup:
//!
//! ```toml
//! [service]
//! name = "backend"
//!
//! [scaling]
//! min_replicas = 1
//! max_replicas = 10
//! scale_up_threshold = 10.0
//! scale_down_threshold = 5.0
//! poll_interval = "5s"
//!
//! [orchestrator]
//! docker_binary = "docker"
//! command_timeout = "10s"
//! ```

use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{ScalingBounds, ScalingThresholds, ServiceTarget};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    pub service: ServiceConfig,
    pub scaling: ScalingConfig,
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "backend".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalingConfig {
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub scale_up_threshold: f64,
    pub scale_down_threshold: f64,
    pub poll_interval: String,
    /// Re-read the actual replica count every N cycles. Off when unset.
    pub resync_every: Option<u32>,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            min_replicas: 1,
            max_replicas: 10,
            scale_up_threshold: 10.0,
            scale_down_threshold: 5.0,
            poll_interval: "5s".to_string(),
            resync_every: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorConfig {
    pub docker_binary: String,
    pub command_timeout: String,
    /// Compose project name passed as `-p` to `docker compose`.
    pub compose_project: Option<String>,
    /// Exported as `DOCKER_API_VERSION` to every docker invocation.
    pub api_version: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            docker_binary: "docker".to_string(),
            command_timeout: "10s".to_string(),
            compose_project: None,
            api_version: None,
        }
    }
}

/// Validated runtime settings, produced by [`FleetConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub service: ServiceTarget,
    pub bounds: ScalingBounds,
    pub thresholds: ScalingThresholds,
    pub poll_interval: Duration,
    pub resync_every: Option<NonZeroU32>,
    pub orchestrator: OrchestratorSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub docker_binary: String,
    pub command_timeout: Duration,
    pub compose_project: Option<String>,
    pub api_version: Option<String>,
}

impl FleetConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every invariant and produce the immutable runtime settings.
    pub fn validate(&self) -> ConfigResult<Settings> {
        let service = ServiceTarget::new(self.service.name.as_str())?;
        let bounds = ScalingBounds::new(self.scaling.min_replicas, self.scaling.max_replicas)?;
        let thresholds = ScalingThresholds::new(
            self.scaling.scale_up_threshold,
            self.scaling.scale_down_threshold,
        )?;

        let poll_interval = parse_required_duration("poll_interval", &self.scaling.poll_interval)?;
        let command_timeout =
            parse_required_duration("command_timeout", &self.orchestrator.command_timeout)?;

        let resync_every = self
            .scaling
            .resync_every
            .map(|n| NonZeroU32::new(n).ok_or(ConfigError::Zero("resync_every")))
            .transpose()?;

        Ok(Settings {
            service,
            bounds,
            thresholds,
            poll_interval,
            resync_every,
            orchestrator: OrchestratorSettings {
                docker_binary: self.orchestrator.docker_binary.clone(),
                command_timeout,
                compose_project: non_empty(&self.orchestrator.compose_project),
                api_version: non_empty(&self.orchestrator.api_version),
            },
        })
    }
}

fn parse_required_duration(field: &'static str, value: &str) -> ConfigResult<Duration> {
    let duration = parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })?;
    if duration.is_zero() {
        return Err(ConfigError::Zero(field));
    }
    Ok(duration)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse a duration string like "500ms", "30s", "5m", or bare seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
