//! Control loop — sample, decide, actuate, sleep, repeat.
//!
//! ```text
//! Initializing ── list_instances ──▶ seed ReplicaState (clamped into bounds)
//!      │
//!      ▼
//! Running ── every poll_interval ──▶ [resync?] → [correct?] → sample → decide → [actuate]
//! ```
//!
//! Exactly one task drives a `Controller`, so `ReplicaState` has a single
//! writer. A cycle finishes its actuation call before the next one starts.

use anyhow::Context;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use fleetscale_core::Settings;
use fleetscale_metrics::UtilizationSample;
use fleetscale_orchestrator::Orchestrator;

use crate::actuator::Actuator;
use crate::decision::{DecisionOutcome, ReplicaState};

/// What happened during one control cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub sample: UtilizationSample,
    pub replicas_before: u32,
    pub replicas_after: u32,
    pub outcome: DecisionOutcome,
    /// Set when a scale request failed. The belief is updated anyway.
    pub actuation_error: Option<String>,
    /// Previous belief, when a resync replaced it with a different count.
    pub drift: Option<u32>,
    /// Target sent because the observed fleet was outside the bounds.
    pub correction: Option<u32>,
}

pub struct Controller<O> {
    orchestrator: O,
    settings: Settings,
    actuator: Actuator,
    state: ReplicaState,
    /// Clamped target not yet sent to the orchestrator.
    pending_correction: Option<u32>,
    cycles: u64,
}

impl<O: Orchestrator> Controller<O> {
    /// Read the actual replica count from the orchestrator and seed the
    /// controller's state with it.
    ///
    /// A count outside the bounds is clamped, and the clamped target is sent
    /// to the orchestrator at the start of the first cycle.
    pub async fn initialize(orchestrator: O, settings: Settings) -> anyhow::Result<Self> {
        let instances = orchestrator
            .list_instances(&settings.service)
            .await
            .with_context(|| {
                format!(
                    "failed to read initial replica count of {}",
                    settings.service
                )
            })?;

        let state = ReplicaState::seed(instances.len(), &settings.bounds);
        info!(
            service = %settings.service,
            observed = instances.len(),
            replicas = state.replicas(),
            "controller initialized"
        );

        Ok(Self {
            orchestrator,
            settings,
            actuator: Actuator::live(),
            state,
            pending_correction: out_of_bounds(instances.len(), state),
            cycles: 0,
        })
    }

    pub fn with_actuator(mut self, actuator: Actuator) -> Self {
        self.actuator = actuator;
        self
    }

    /// Current belief about the replica count.
    pub fn replicas(&self) -> u32 {
        self.state.replicas()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run a single control cycle.
    ///
    /// Only a sampling error of an unexpected kind is returned; a failed
    /// scale request is logged and reported in the `CycleReport`.
    ///
    /// In dry-run mode decisions are logged but the belief is left alone,
    /// since the fleet it describes never changes.
    pub async fn run_cycle(&mut self) -> anyhow::Result<CycleReport> {
        self.cycles += 1;
        let drift = self.resync_if_due().await;
        let mut actuation_error = None;
        let correction = self.pending_correction.take();

        let service = &self.settings.service;
        if let Some(target) = correction {
            info!(%service, target, "fleet outside bounds, correcting");
            if let Err(e) = self
                .actuator
                .apply(&self.orchestrator, service, target)
                .await
            {
                error!(%service, target, error = %e, "bounds correction failed");
                actuation_error = Some(e.to_string());
                self.pending_correction = Some(target);
            }
        }

        let replicas_before = self.state.replicas();

        let sample = fleetscale_metrics::sample(&self.orchestrator, service)
            .await
            .context("utilization sampling failed")?;

        let outcome = self.state.decide(
            sample.utilization,
            &self.settings.bounds,
            &self.settings.thresholds,
        );

        info!(
            %service,
            cycle = self.cycles,
            utilization = sample.utilization,
            replicas = replicas_before,
            action = %outcome,
            "control cycle"
        );
        if let Some(reason) = sample.fallback {
            debug!(%service, %reason, "utilization is a fallback value");
        }

        if let Some(target) = outcome.target() {
            if !self.actuator.is_dry_run() {
                self.state = self.state.apply(outcome);
            }
            if let Err(e) = self
                .actuator
                .apply(&self.orchestrator, service, target)
                .await
            {
                error!(%service, target, error = %e, "scaling action failed");
                actuation_error = Some(e.to_string());
            }
        }

        Ok(CycleReport {
            cycle: self.cycles,
            sample,
            replicas_before,
            replicas_after: self.state.replicas(),
            outcome,
            actuation_error,
            drift,
            correction,
        })
    }

    /// Replace the belief with the orchestrator's actual count every
    /// `resync_every` cycles. Returns the old belief if it differed.
    async fn resync_if_due(&mut self) -> Option<u32> {
        let every = self.settings.resync_every?;
        if self.cycles % u64::from(every.get()) != 0 {
            return None;
        }

        match self.orchestrator.list_instances(&self.settings.service).await {
            Ok(instances) => {
                let believed = self.state.replicas();
                self.state = ReplicaState::seed(instances.len(), &self.settings.bounds);
                self.pending_correction = out_of_bounds(instances.len(), self.state);
                if self.state.replicas() == believed {
                    return None;
                }
                warn!(
                    service = %self.settings.service,
                    believed,
                    observed = instances.len(),
                    replicas = self.state.replicas(),
                    "replica count drifted, resynchronized"
                );
                Some(believed)
            }
            Err(e) => {
                warn!(
                    service = %self.settings.service,
                    error = %e,
                    "resync failed, keeping current belief"
                );
                None
            }
        }
    }

    /// Run cycles until the shutdown signal fires.
    ///
    /// The signal is only observed between cycles; an in-flight
    /// orchestrator call is allowed to finish.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            service = %self.settings.service,
            interval_ms = self.settings.poll_interval.as_millis() as u64,
            dry_run = self.actuator.is_dry_run(),
            "autoscaler started"
        );

        loop {
            let stopping = *shutdown.borrow();
            if stopping {
                break;
            }

            if let Err(e) = self.run_cycle().await {
                error!(error = %format!("{e:#}"), "control cycle failed");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!(cycles = self.cycles, "autoscaler shutting down");
    }
}

/// The seeded target when `observed` had to be clamped to produce `state`.
fn out_of_bounds(observed: usize, state: ReplicaState) -> Option<u32> {
    (observed != state.replicas() as usize).then_some(state.replicas())
}
