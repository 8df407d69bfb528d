//! Metric sampler — mean CPU utilization of a service's running instances.

use std::fmt;

use tracing::{debug, warn};

use fleetscale_core::ServiceTarget;
use fleetscale_orchestrator::{Orchestrator, OrchestratorResult};

/// Utilization reported when no real measurement is available.
pub const FALLBACK_UTILIZATION: f64 = 0.0;

/// Why a sample carries [`FALLBACK_UTILIZATION`] instead of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    NoInstances,
    NoValidReadings,
    OrchestratorUnavailable,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoInstances => "no running instances",
            Self::NoValidReadings => "no valid readings",
            Self::OrchestratorUnavailable => "orchestrator unavailable",
        })
    }
}

/// Mean CPU percentage across the fleet at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilizationSample {
    pub utilization: f64,
    /// Running instances seen when sampling.
    pub instances: usize,
    /// Readings that parsed and went into the mean.
    pub readings: usize,
    pub fallback: Option<FallbackReason>,
}

impl UtilizationSample {
    fn fallback(reason: FallbackReason, instances: usize) -> Self {
        Self {
            utilization: FALLBACK_UTILIZATION,
            instances,
            readings: 0,
            fallback: Some(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Parse one CPU reading such as `"12.34%"`.
///
/// Returns `None` for empty, non-numeric, non-finite, or negative input.
pub fn parse_cpu_percent(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    number
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample the mean CPU utilization of `service`.
pub async fn sample<O: Orchestrator>(
    orchestrator: &O,
    service: &ServiceTarget,
) -> OrchestratorResult<UtilizationSample> {
    let instances = match orchestrator.list_instances(service).await {
        Ok(instances) => instances,
        Err(e) if e.is_unavailable() => {
            warn!(%service, error = %e, "instance listing unavailable, assuming idle");
            return Ok(UtilizationSample::fallback(
                FallbackReason::OrchestratorUnavailable,
                0,
            ));
        }
        Err(e) => return Err(e),
    };

    if instances.is_empty() {
        debug!(%service, "no running instances");
        return Ok(UtilizationSample::fallback(FallbackReason::NoInstances, 0));
    }

    let raw = match orchestrator.sample_utilization(&instances).await {
        Ok(raw) => raw,
        Err(e) if e.is_unavailable() => {
            warn!(%service, error = %e, "utilization unavailable, assuming idle");
            return Ok(UtilizationSample::fallback(
                FallbackReason::OrchestratorUnavailable,
                instances.len(),
            ));
        }
        Err(e) => return Err(e),
    };

    let values: Vec<f64> = raw
        .iter()
        .filter_map(|reading| {
            let parsed = parse_cpu_percent(reading);
            if parsed.is_none() {
                debug!(%service, reading = %reading, "discarding malformed reading");
            }
            parsed
        })
        .collect();

    match mean(&values) {
        Some(utilization) => Ok(UtilizationSample {
            utilization,
            instances: instances.len(),
            readings: values.len(),
            fallback: None,
        }),
        None => {
            warn!(%service, instances = instances.len(), "no parsable readings, assuming idle");
            Ok(UtilizationSample::fallback(
                FallbackReason::NoValidReadings,
                instances.len(),
            ))
        }
    }
}
