//! CLI error types with exit code handling
//!
//! Every failure of a run ends up as a [`CliError`]; the category decides the
//! process exit code.

use miette::Diagnostic;
use shipyard_core::CoreError;
use shipyard_engine::EngineError;
use shipyard_kube::KubeError;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Missing or malformed inputs
    #[error("Configuration error: {message}")]
    #[diagnostic(code(shipyard::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Expiry requested on a release that is not a preview release
    #[error("ttl is set but release name {release} does not contain '{marker}'")]
    #[diagnostic(
        code(shipyard::cli::ttl),
        help("only preview releases may expire: unset `ttl` or deploy a pull-request release")
    )]
    TtlWithoutPreviewRelease { release: String, marker: String },

    /// A value file failed to render
    #[error("Template error: {message}")]
    #[diagnostic(code(shipyard::cli::template))]
    Template { message: String },

    /// Cluster authentication failed
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(shipyard::cli::auth),
        help("check the clustersajson, clusterproject, clusterlocation and clustername inputs")
    )]
    Auth { message: String },

    /// A fatal release step failed
    #[error("Release failed: {message}")]
    #[diagnostic(code(shipyard::cli::release))]
    Release { message: String },

    /// IO error (generated files, event payload)
    #[error("IO error: {message}")]
    #[diagnostic(code(shipyard::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } | CliError::TtlWithoutPreviewRelease { .. } => {
                exit_codes::CONFIG_ERROR
            }
            CliError::Template { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Auth { .. } => exit_codes::AUTH_ERROR,
            CliError::Release { .. } => exit_codes::RELEASE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Whether the failure must still be reported to the deployment API
    pub fn reports_failure(&self) -> bool {
        !matches!(self, CliError::TtlWithoutPreviewRelease { .. })
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingInput { ref name } => CliError::Config {
                help: Some(format!("set the `{}` input", name)),
                message: err.to_string(),
            },
            CoreError::TtlWithoutPreviewRelease { release, marker } => {
                CliError::TtlWithoutPreviewRelease {
                    release,
                    marker: marker.to_string(),
                }
            }
            CoreError::Io(e) => CliError::from(e),
            other => CliError::config(other.to_string()),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Read { .. } | EngineError::Write { .. } => CliError::Io {
                message: err.to_string(),
            },
            other => CliError::Template {
                message: other.to_string(),
            },
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::Authentication(message) => CliError::Auth { message },
            KubeError::Io(e) => CliError::from(e),
            other => CliError::Release {
                message: other.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
