//! Error types for shipyard-kube

use thiserror::Error;

use crate::plan::Step;

/// Result type for shipyard-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while talking to the cluster tooling
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// A fatal step exited unsuccessfully
    #[error("{step} failed: `{program}` exited with status {code}")]
    StepFailed {
        step: Step,
        program: String,
        code: i32,
    },

    /// The executable could not be started
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Cluster authentication failed
    #[error("cluster authentication failed: {0}")]
    Authentication(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
