//! fleetscale-orchestrator — the process boundary of the control loop.
//!
//! The loop only ever needs three things from a container orchestrator:
//!
//! ```text
//! Orchestrator
//!   ├── list_instances(service)       → running instance ids
//!   ├── sample_utilization(instances) → one raw CPU reading per instance
//!   └── scale(service, replicas)      → fire-and-forget resize
//! ```
//!
//! `DockerOrchestrator` shells out to the docker CLI with a per-call
//! timeout. `MockOrchestrator` keeps everything in memory for tests.

pub mod client;
pub mod docker;
pub mod error;
pub mod mock;

pub use client::{InstanceId, Orchestrator};
pub use docker::DockerOrchestrator;
pub use error::{OrchestratorError, OrchestratorResult};
pub use mock::{MockFailure, MockOrchestrator};
