//! fleetscale-metrics — reduces a fleet to one utilization number.
//!
//! # Fallback contract
//!
//! Sampling never fails because the orchestrator is unreachable. An empty
//! fleet, readings that do not parse, and any
//! [`OrchestratorError::is_unavailable`](fleetscale_orchestrator::OrchestratorError::is_unavailable)
//! failure all produce [`FALLBACK_UTILIZATION`] (0%), which sits below any
//! valid scale-down threshold: the loop holds or scales down, never up.
//! Errors of any other kind are returned to the caller.

pub mod sampler;

pub use sampler::{
    FALLBACK_UTILIZATION, FallbackReason, UtilizationSample, mean, parse_cpu_percent, sample,
};
