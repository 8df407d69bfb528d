//! Actuator — hands a target replica count to the orchestrator.
//!
//! One request per decision. Convergence is not polled: the next cycle's
//! sample is what observes whether the change took effect.

use tracing::info;

use fleetscale_core::ServiceTarget;
use fleetscale_orchestrator::{Orchestrator, OrchestratorResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actuator {
    dry_run: bool,
}

impl Actuator {
    pub fn live() -> Self {
        Self { dry_run: false }
    }

    /// Log decisions without sending them to the orchestrator.
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub async fn apply<O: Orchestrator>(
        &self,
        orchestrator: &O,
        service: &ServiceTarget,
        target_replicas: u32,
    ) -> OrchestratorResult<()> {
        if self.dry_run {
            info!(%service, target = target_replicas, "dry run, not scaling");
            return Ok(());
        }
        info!(%service, target = target_replicas, "scaling service");
        orchestrator.scale(service, target_replicas).await
    }
}
