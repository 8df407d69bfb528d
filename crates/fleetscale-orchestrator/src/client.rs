//! The typed orchestrator interface consumed by the control loop.

use std::fmt;
use std::future::Future;

use fleetscale_core::ServiceTarget;

use crate::error::OrchestratorResult;

/// Opaque orchestrator identifier of one running instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations the control loop needs from a container orchestrator.
///
/// Implementations must be safe to call repeatedly; the loop issues at most
/// one call at a time.
pub trait Orchestrator: Send + Sync {
    /// Identifiers of the currently running instances of `service`.
    fn list_instances(
        &self,
        service: &ServiceTarget,
    ) -> impl Future<Output = OrchestratorResult<Vec<InstanceId>>> + Send;

    /// One single-shot CPU reading per instance, as reported by the
    /// orchestrator (e.g. `"12.34%"`). Readings are not parsed here.
    fn sample_utilization(
        &self,
        instances: &[InstanceId],
    ) -> impl Future<Output = OrchestratorResult<Vec<String>>> + Send;

    /// Ask the orchestrator to converge `service` to `replicas` instances.
    /// Returns once the request is accepted, not once it has converged.
    fn scale(
        &self,
        service: &ServiceTarget,
        replicas: u32,
    ) -> impl Future<Output = OrchestratorResult<()>> + Send;
}
