//! In-memory orchestrator for tests and dry runs.
//!
//! Instances are named `<service>-<n>`. A scale call converges the fleet
//! immediately unless `follow_scale` has been turned off. Clones share
//! state, so a test can keep a handle while the controller owns another.

use std::sync::{Arc, Mutex, MutexGuard};

use fleetscale_core::ServiceTarget;

use crate::client::{InstanceId, Orchestrator};
use crate::error::{OrchestratorError, OrchestratorResult};

/// Kind of failure a mock operation should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Behave like an unreachable orchestrator (non-zero exit).
    Unavailable,
    /// Behave like a malformed request.
    InvalidArgument,
}

impl MockFailure {
    fn to_error(self, operation: &str) -> OrchestratorError {
        match self {
            Self::Unavailable => OrchestratorError::Exit {
                command: format!("mock {operation}"),
                status: "exit status: 1".to_string(),
                stderr: "orchestrator unavailable".to_string(),
            },
            Self::InvalidArgument => {
                OrchestratorError::InvalidArgument(format!("mock {operation} rejected"))
            }
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    running: u32,
    readings: Vec<String>,
    default_reading: Option<String>,
    follow_scale: bool,
    scale_calls: Vec<(ServiceTarget, u32)>,
    fail_list: Option<MockFailure>,
    fail_list_once: Option<MockFailure>,
    fail_sample: Option<MockFailure>,
    fail_scale: Option<MockFailure>,
}

#[derive(Debug, Clone)]
pub struct MockOrchestrator {
    state: Arc<Mutex<MockState>>,
}

impl MockOrchestrator {
    pub fn new(running: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                running,
                follow_scale: true,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Change the running count out-of-band.
    pub fn set_running(&self, running: u32) {
        self.lock().running = running;
    }

    pub fn running(&self) -> u32 {
        self.lock().running
    }

    /// Per-instance readings, by instance index.
    pub fn set_readings<I, S>(&self, readings: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().readings = readings.into_iter().map(Into::into).collect();
    }

    /// Reading used for instances without a per-index reading.
    pub fn set_default_reading(&self, reading: impl Into<String>) {
        self.lock().default_reading = Some(reading.into());
    }

    /// Whether scale calls change the running count.
    pub fn set_follow_scale(&self, follow: bool) {
        self.lock().follow_scale = follow;
    }

    pub fn fail_list(&self, failure: Option<MockFailure>) {
        self.lock().fail_list = failure;
    }

    /// Fail only the next `list_instances` call.
    pub fn fail_list_once(&self, failure: MockFailure) {
        self.lock().fail_list_once = Some(failure);
    }

    pub fn fail_sample(&self, failure: Option<MockFailure>) {
        self.lock().fail_sample = failure;
    }

    pub fn fail_scale(&self, failure: Option<MockFailure>) {
        self.lock().fail_scale = failure;
    }

    /// Every scale request received so far, successful or not.
    pub fn scale_calls(&self) -> Vec<(ServiceTarget, u32)> {
        self.lock().scale_calls.clone()
    }
}

impl Orchestrator for MockOrchestrator {
    async fn list_instances(&self, service: &ServiceTarget) -> OrchestratorResult<Vec<InstanceId>> {
        let mut state = self.lock();
        if let Some(failure) = state.fail_list_once.take().or(state.fail_list) {
            return Err(failure.to_error("list"));
        }
        Ok((0..state.running)
            .map(|n| InstanceId::new(format!("{service}-{n}")))
            .collect())
    }

    async fn sample_utilization(&self, instances: &[InstanceId]) -> OrchestratorResult<Vec<String>> {
        let state = self.lock();
        if let Some(failure) = state.fail_sample {
            return Err(failure.to_error("stats"));
        }
        if instances.is_empty() {
            return Err(OrchestratorError::InvalidArgument(
                "no instances to sample".to_string(),
            ));
        }
        Ok((0..instances.len())
            .map(|i| {
                state
                    .readings
                    .get(i)
                    .or(state.default_reading.as_ref())
                    .cloned()
                    .unwrap_or_default()
            })
            .collect())
    }

    async fn scale(&self, service: &ServiceTarget, replicas: u32) -> OrchestratorResult<()> {
        let mut state = self.lock();
        state.scale_calls.push((service.clone(), replicas));
        if let Some(failure) = state.fail_scale {
            return Err(failure.to_error("scale"));
        }
        if state.follow_scale {
            state.running = replicas;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> ServiceTarget {
        ServiceTarget::new("backend").unwrap()
    }

    #[tokio::test]
    async fn lists_named_instances() {
        let mock = MockOrchestrator::new(2);
        let ids = mock.list_instances(&backend()).await.unwrap();
        assert_eq!(ids, vec![InstanceId::new("backend-0"), InstanceId::new("backend-1")]);
    }

    #[tokio::test]
    async fn readings_fall_back_to_default_then_empty() {
        let mock = MockOrchestrator::new(3);
        mock.set_readings(["1.0%"]);
        let ids = mock.list_instances(&backend()).await.unwrap();
        assert_eq!(
            mock.sample_utilization(&ids).await.unwrap(),
            vec!["1.0%", "", ""]
        );

        mock.set_default_reading("9%");
        assert_eq!(
            mock.sample_utilization(&ids).await.unwrap(),
            vec!["1.0%", "9%", "9%"]
        );
    }

    #[tokio::test]
    async fn scale_converges_and_is_recorded() {
        let mock = MockOrchestrator::new(1);
        let handle = mock.clone();
        mock.scale(&backend(), 4).await.unwrap();
        assert_eq!(handle.running(), 4);
        assert_eq!(handle.scale_calls(), vec![(backend(), 4)]);

        handle.set_follow_scale(false);
        mock.scale(&backend(), 2).await.unwrap();
        assert_eq!(handle.running(), 4);
    }

    #[tokio::test]
    async fn injected_failures() {
        let mock = MockOrchestrator::new(1);
        mock.fail_list(Some(MockFailure::Unavailable));
        assert!(mock.list_instances(&backend()).await.unwrap_err().is_unavailable());

        mock.fail_scale(Some(MockFailure::InvalidArgument));
        let err = mock.scale(&backend(), 2).await.unwrap_err();
        assert!(!err.is_unavailable());
        assert_eq!(mock.scale_calls().len(), 1);
        assert_eq!(mock.running(), 1);
    }

    #[tokio::test]
    async fn one_shot_list_failure_clears_itself() {
        let mock = MockOrchestrator::new(2);
        mock.fail_list_once(MockFailure::Unavailable);
        assert!(mock.list_instances(&backend()).await.is_err());
        assert_eq!(mock.list_instances(&backend()).await.unwrap().len(), 2);
    }
}
