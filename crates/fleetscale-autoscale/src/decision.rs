//! Scaling decision engine.
//!
//! Pure functions over in-memory state: no I/O, no clock, no randomness.

use std::fmt;

use tracing::warn;

use fleetscale_core::{ScalingBounds, ScalingThresholds};

/// Outcome of one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Add one replica; carries the new target count.
    ScaleUp(u32),
    /// Remove one replica; carries the new target count.
    ScaleDown(u32),
    /// No change needed.
    Hold,
}

impl DecisionOutcome {
    /// Target replica count, if this outcome scales.
    pub fn target(&self) -> Option<u32> {
        match self {
            Self::ScaleUp(target) | Self::ScaleDown(target) => Some(*target),
            Self::Hold => None,
        }
    }
}

impl fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScaleUp(target) => write!(f, "scale up to {target}"),
            Self::ScaleDown(target) => write!(f, "scale down to {target}"),
            Self::Hold => f.write_str("hold"),
        }
    }
}

/// Decide whether to add, remove, or keep replicas.
///
/// First match wins: scale up above the up-threshold unless at the ceiling,
/// scale down below the down-threshold unless at the floor, otherwise hold.
/// Comparisons are strict, so a reading exactly on a threshold holds, and a
/// NaN reading always holds.
pub fn decide(
    current_replicas: u32,
    utilization: f64,
    bounds: &ScalingBounds,
    thresholds: &ScalingThresholds,
) -> DecisionOutcome {
    if utilization > thresholds.scale_up() && current_replicas < bounds.max_replicas() {
        DecisionOutcome::ScaleUp(current_replicas + 1)
    } else if utilization < thresholds.scale_down() && current_replicas > bounds.min_replicas() {
        DecisionOutcome::ScaleDown(current_replicas - 1)
    } else {
        DecisionOutcome::Hold
    }
}

/// The controller's belief about the current replica count.
///
/// Always within the bounds it was seeded with. The orchestrator remains the
/// source of truth; this view may lag it until a scale request converges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaState {
    replicas: u32,
}

impl ReplicaState {
    /// Seed from an observed running-instance count, clamped into `bounds`.
    pub fn seed(observed: usize, bounds: &ScalingBounds) -> Self {
        let observed_u32 = u32::try_from(observed).unwrap_or(u32::MAX);
        let replicas = bounds.clamp(observed_u32);
        if replicas != observed_u32 {
            warn!(
                observed,
                seeded = replicas,
                min = bounds.min_replicas(),
                max = bounds.max_replicas(),
                "observed replica count outside bounds, clamping"
            );
        }
        Self { replicas }
    }

    pub fn replicas(&self) -> u32 {
        self.replicas
    }

    /// Decide against this state.
    pub fn decide(
        &self,
        utilization: f64,
        bounds: &ScalingBounds,
        thresholds: &ScalingThresholds,
    ) -> DecisionOutcome {
        decide(self.replicas, utilization, bounds, thresholds)
    }

    /// The state after `outcome` is carried out.
    pub fn apply(self, outcome: DecisionOutcome) -> Self {
        match outcome.target() {
            Some(replicas) => Self { replicas },
            None => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> ScalingBounds {
        ScalingBounds::new(1, 10).unwrap()
    }

    fn thresholds() -> ScalingThresholds {
        ScalingThresholds::new(10.0, 5.0).unwrap()
    }

    #[test]
    fn scenario_scale_up() {
        assert_eq!(
            decide(2, 12.0, &bounds(), &thresholds()),
            DecisionOutcome::ScaleUp(3)
        );
    }

    #[test]
    fn scenario_scale_down() {
        assert_eq!(
            decide(3, 4.0, &bounds(), &thresholds()),
            DecisionOutcome::ScaleDown(2)
        );
    }

    #[test]
    fn scenario_hold_in_dead_zone() {
        assert_eq!(decide(3, 7.5, &bounds(), &thresholds()), DecisionOutcome::Hold);
    }

    #[test]
    fn scenario_ceiling_reached() {
        assert_eq!(decide(10, 50.0, &bounds(), &thresholds()), DecisionOutcome::Hold);
    }

    #[test]
    fn floor_reached() {
        assert_eq!(decide(1, 0.0, &bounds(), &thresholds()), DecisionOutcome::Hold);
    }

    #[test]
    fn exact_thresholds_hold() {
        assert_eq!(decide(3, 10.0, &bounds(), &thresholds()), DecisionOutcome::Hold);
        assert_eq!(decide(3, 5.0, &bounds(), &thresholds()), DecisionOutcome::Hold);
    }

    #[test]
    fn nan_holds() {
        assert_eq!(
            decide(3, f64::NAN, &bounds(), &thresholds()),
            DecisionOutcome::Hold
        );
    }

    #[test]
    fn dead_zone_always_holds() {
        let t = thresholds();
        for current in 2..10 {
            for tenth in 51..100 {
                let utilization = tenth as f64 / 10.0;
                assert!(t.in_dead_zone(utilization));
                assert_eq!(
                    decide(current, utilization, &bounds(), &t),
                    DecisionOutcome::Hold,
                    "current={current} utilization={utilization}"
                );
            }
        }
    }

    #[test]
    fn targets_stay_in_bounds_and_move_one_step() {
        let b = ScalingBounds::new(2, 6).unwrap();
        let t = thresholds();
        let utilizations = [0.0, 4.99, 5.0, 7.5, 10.0, 10.01, 55.0, 100.0, 400.0];

        for current in b.min_replicas()..=b.max_replicas() {
            for &utilization in &utilizations {
                let outcome = decide(current, utilization, &b, &t);
                if let Some(target) = outcome.target() {
                    assert!(b.contains(target), "{outcome} escapes bounds");
                    assert_eq!(target.abs_diff(current), 1, "{outcome} from {current}");
                }
                if current == b.max_replicas() {
                    assert!(!matches!(outcome, DecisionOutcome::ScaleUp(_)));
                }
                if current == b.min_replicas() {
                    assert!(!matches!(outcome, DecisionOutcome::ScaleDown(_)));
                }
            }
        }
    }

    #[test]
    fn pinned_bounds_never_scale() {
        let b = ScalingBounds::new(3, 3).unwrap();
        assert_eq!(decide(3, 99.0, &b, &thresholds()), DecisionOutcome::Hold);
        assert_eq!(decide(3, 0.0, &b, &thresholds()), DecisionOutcome::Hold);
    }

    #[test]
    fn seed_clamps_into_bounds() {
        let b = ScalingBounds::new(2, 5).unwrap();
        assert_eq!(ReplicaState::seed(0, &b).replicas(), 2);
        assert_eq!(ReplicaState::seed(4, &b).replicas(), 4);
        assert_eq!(ReplicaState::seed(12, &b).replicas(), 5);
    }

    #[test]
    fn apply_threads_state() {
        let b = bounds();
        let t = thresholds();
        let state = ReplicaState::seed(2, &b);

        let outcome = state.decide(12.0, &b, &t);
        let state = state.apply(outcome);
        assert_eq!(state.replicas(), 3);

        let state = state.apply(DecisionOutcome::Hold);
        assert_eq!(state.replicas(), 3);

        let outcome = state.decide(1.0, &b, &t);
        assert_eq!(state.apply(outcome).replicas(), 2);
    }

    #[test]
    fn outcome_display() {
        assert_eq!(DecisionOutcome::ScaleUp(3).to_string(), "scale up to 3");
        assert_eq!(DecisionOutcome::ScaleDown(2).to_string(), "scale down to 2");
        assert_eq!(DecisionOutcome::Hold.to_string(), "hold");
    }
}
