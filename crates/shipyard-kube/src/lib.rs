//! Shipyard Kube - cluster integration for the release orchestrator
//!
//! This crate provides:
//! - **Command plans**: Ordered external invocations with per-step failure policy
//! - **Release planning**: Upgrade, delete, canary cleanup and TTL steps for helm2/helm3
//! - **Authentication**: Service account activation and cluster credentials via gcloud
//! - **Execution**: Strictly ordered execution through a pluggable command runner
//! - **Artifacts**: Generated values and kubeconfig files

pub mod artifacts;
pub mod auth;
pub mod env;
pub mod error;
pub mod plan;
pub mod planner;
pub mod runner;
pub mod sequencer;

pub use artifacts::{KUBECONFIG_FILE_NAME, VALUES_FILE_NAME, write_kubeconfig, write_values_file};
pub use auth::{Authenticator, ClusterSession, GCLOUD_BINARY};
pub use env::{EnvOverlay, PROVIDER_OVERRIDE_VARS, engine_environment, provider_environment};
pub use error::{KubeError, Result};
pub use plan::{CommandPlan, FailurePolicy, Invocation, Step};
pub use planner::ReleasePlanner;
pub use runner::{CommandRunner, MockRunner, ProcessRunner};
pub use sequencer::{ExecutionReport, Sequencer, StepOutcome};
