//! Docker CLI orchestrator.
//!
//! Commands issued:
//! 1. `docker ps -q --filter name=<service> --filter status=running`
//! 2. `docker stats --no-stream --format {{.CPUPerc}} <id>...`
//! 3. `docker compose [-p <project>] up -d --no-recreate --scale <service>=<n>`
//!
//! Every invocation is bounded by `timeout`; the child is killed when the
//! deadline passes.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use fleetscale_core::{OrchestratorSettings, ServiceTarget};

use crate::client::{InstanceId, Orchestrator};
use crate::error::{OrchestratorError, OrchestratorResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct DockerOrchestrator {
    binary: String,
    timeout: Duration,
    compose_project: Option<String>,
    api_version: Option<String>,
}

impl DockerOrchestrator {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_TIMEOUT,
            compose_project: None,
            api_version: None,
        }
    }

    pub fn from_settings(settings: &OrchestratorSettings) -> Self {
        Self {
            binary: settings.docker_binary.clone(),
            timeout: settings.command_timeout,
            compose_project: settings.compose_project.clone(),
            api_version: settings.api_version.clone(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_compose_project(mut self, project: impl Into<String>) -> Self {
        self.compose_project = Some(project.into());
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    fn list_args(service: &ServiceTarget) -> Vec<String> {
        vec![
            "ps".to_string(),
            "-q".to_string(),
            "--filter".to_string(),
            format!("name={service}"),
            "--filter".to_string(),
            "status=running".to_string(),
        ]
    }

    fn stats_args(instances: &[InstanceId]) -> Vec<String> {
        let mut args = vec![
            "stats".to_string(),
            "--no-stream".to_string(),
            "--format".to_string(),
            "{{.CPUPerc}}".to_string(),
        ];
        args.extend(instances.iter().map(|id| id.as_str().to_string()));
        args
    }

    fn scale_args(&self, service: &ServiceTarget, replicas: u32) -> Vec<String> {
        let mut args = vec!["compose".to_string()];
        if let Some(project) = &self.compose_project {
            args.push("-p".to_string());
            args.push(project.clone());
        }
        args.extend([
            "up".to_string(),
            "-d".to_string(),
            "--no-recreate".to_string(),
            "--scale".to_string(),
            format!("{service}={replicas}"),
        ]);
        args
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    /// Run the binary with `args` and return its stdout.
    async fn run(&self, args: Vec<String>) -> OrchestratorResult<String> {
        let command = self.describe(&args);

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(version) = &self.api_version {
            cmd.env("DOCKER_API_VERSION", version);
        }

        debug!(%command, "running orchestrator command");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(OrchestratorError::Spawn { command, source }),
            Err(_) => {
                return Err(OrchestratorError::Timeout {
                    command,
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(OrchestratorError::Exit {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| OrchestratorError::Parse {
            command,
            message: e.to_string(),
        })
    }
}

impl Default for DockerOrchestrator {
    fn default() -> Self {
        Self::new("docker")
    }
}

/// Non-empty, trimmed lines of command output.
fn output_lines(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.lines().map(str::trim).filter(|line| !line.is_empty())
}

impl Orchestrator for DockerOrchestrator {
    async fn list_instances(&self, service: &ServiceTarget) -> OrchestratorResult<Vec<InstanceId>> {
        let stdout = self.run(Self::list_args(service)).await?;
        Ok(output_lines(&stdout).map(InstanceId::new).collect())
    }

    async fn sample_utilization(&self, instances: &[InstanceId]) -> OrchestratorResult<Vec<String>> {
        // `docker stats` without ids reports every container on the host.
        if instances.is_empty() {
            return Err(OrchestratorError::InvalidArgument(
                "no instances to sample".to_string(),
            ));
        }
        let stdout = self.run(Self::stats_args(instances)).await?;
        Ok(output_lines(&stdout).map(str::to_string).collect())
    }

    async fn scale(&self, service: &ServiceTarget, replicas: u32) -> OrchestratorResult<()> {
        if replicas == 0 {
            return Err(OrchestratorError::InvalidArgument(format!(
                "refusing to scale {service} to zero replicas"
            )));
        }
        self.run(self.scale_args(service, replicas)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> ServiceTarget {
        ServiceTarget::new("backend").unwrap()
    }

    #[test]
    fn list_args_filter_running_by_name() {
        assert_eq!(
            DockerOrchestrator::list_args(&backend()).join(" "),
            "ps -q --filter name=backend --filter status=running"
        );
    }

    #[test]
    fn stats_args_single_shot_per_instance() {
        let ids = [InstanceId::new("a1b2"), InstanceId::new("c3d4")];
        assert_eq!(
            DockerOrchestrator::stats_args(&ids).join(" "),
            "stats --no-stream --format {{.CPUPerc}} a1b2 c3d4"
        );
    }

    #[test]
    fn scale_args_with_and_without_project() {
        let plain = DockerOrchestrator::default();
        assert_eq!(
            plain.scale_args(&backend(), 3).join(" "),
            "compose up -d --no-recreate --scale backend=3"
        );

        let project = DockerOrchestrator::default().with_compose_project("autoscale-app");
        assert_eq!(
            project.scale_args(&backend(), 4).join(" "),
            "compose -p autoscale-app up -d --no-recreate --scale backend=4"
        );
    }

    #[test]
    fn from_settings_copies_fields() {
        let settings = OrchestratorSettings {
            docker_binary: "/usr/local/bin/docker".to_string(),
            command_timeout: Duration::from_secs(3),
            compose_project: Some("p".to_string()),
            api_version: Some("1.44".to_string()),
        };
        let docker = DockerOrchestrator::from_settings(&settings);
        assert_eq!(docker.binary, "/usr/local/bin/docker");
        assert_eq!(docker.timeout, Duration::from_secs(3));
        assert_eq!(docker.compose_project.as_deref(), Some("p"));
        assert_eq!(docker.api_version.as_deref(), Some("1.44"));
    }

    #[test]
    fn output_lines_skips_blanks() {
        let lines: Vec<&str> = output_lines("12.5%\n\n  3.0% \n").collect();
        assert_eq!(lines, vec!["12.5%", "3.0%"]);
    }

    #[tokio::test]
    async fn empty_sample_request_is_invalid() {
        let err = DockerOrchestrator::default()
            .sample_utilization(&[])
            .await
            .unwrap_err();
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let docker = DockerOrchestrator::new("/nonexistent/fleetscale-docker");
        let err = docker.list_instances(&backend()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Spawn { .. }));
        assert!(err.is_unavailable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_exit_error() {
        let err = DockerOrchestrator::new("false")
            .run(vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Exit { .. }));
        assert!(err.is_unavailable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_times_out() {
        let docker = DockerOrchestrator::new("sleep").with_timeout(Duration::from_millis(50));
        let err = docker.run(vec!["5".to_string()]).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Timeout { .. }));
        assert!(err.is_unavailable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_returned() {
        let out = DockerOrchestrator::new("echo")
            .run(vec!["7.5%".to_string()])
            .await
            .unwrap();
        assert_eq!(out.trim(), "7.5%");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn api_version_is_exported_to_the_child() {
        let out = DockerOrchestrator::new("sh")
            .with_api_version("1.44")
            .run(vec!["-c".to_string(), "echo $DOCKER_API_VERSION".to_string()])
            .await
            .unwrap();
        assert_eq!(out.trim(), "1.44");
    }
}
