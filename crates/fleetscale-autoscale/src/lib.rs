//! fleetscale-autoscale — reactive CPU-driven replica scaling.
//!
//! Samples the mean CPU utilization of one service, compares it against a
//! pair of thresholds, and moves the replica count one step at a time.
//!
//! # Scaling Algorithm
//!
//! ```text
//! if utilization > scale_up_threshold and replicas < max:
//!     ScaleUp(replicas + 1)
//! elif utilization < scale_down_threshold and replicas > min:
//!     ScaleDown(replicas - 1)
//! else:
//!     Hold
//! ```
//!
//! The band between the thresholds is a dead zone that keeps the loop from
//! flapping when utilization sits near a single threshold.

pub mod actuator;
pub mod controller;
pub mod decision;

pub use actuator::Actuator;
pub use controller::{Controller, CycleReport};
pub use decision::{DecisionOutcome, ReplicaState, decide};
