//! Orchestrator error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("unparsable output from `{command}`: {message}")]
    Parse { command: String, message: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl OrchestratorError {
    /// Whether this is the expected, transient kind of failure: the
    /// orchestrator could not be reached or did not answer usefully.
    ///
    /// `InvalidArgument` means the caller built a bad request and is never
    /// considered transient.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Spawn { .. } | Self::Exit { .. } | Self::Timeout { .. } | Self::Parse { .. }
        )
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
