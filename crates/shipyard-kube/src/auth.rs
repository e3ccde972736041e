//! Cluster authentication
//!
//! Activates the service account key with gcloud, installs the cluster's
//! connection context into the kubeconfig, and removes the key file again.
//! The key only ever lives in a transient file that is deleted on every exit
//! path; the cluster context outlives it for the rest of the run.

use std::io::Write;
use std::path::{Path, PathBuf};

use shipyard_core::ClusterTarget;
use tracing::{debug, info, warn};

use crate::env::{EnvOverlay, provider_environment};
use crate::error::{KubeError, Result};
use crate::plan::{CommandPlan, FailurePolicy, Invocation, Step};
use crate::runner::CommandRunner;
use crate::sequencer::Sequencer;

/// Location of gcloud in the runner image
pub const GCLOUD_BINARY: &str = "/opt/google-cloud-sdk/bin/gcloud";

/// An authenticated cluster context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSession {
    /// Account the cluster credentials were issued for
    pub account: String,
    pub cluster: String,
}

/// Runs the gcloud authentication sequence
pub struct Authenticator<'a> {
    runner: &'a dyn CommandRunner,
    gcloud: String,
    key_dir: Option<PathBuf>,
}

impl<'a> Authenticator<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            gcloud: GCLOUD_BINARY.to_string(),
            key_dir: None,
        }
    }

    /// Use a different gcloud executable
    pub fn with_gcloud(mut self, gcloud: impl Into<String>) -> Self {
        self.gcloud = gcloud.into();
        self
    }

    /// Create the transient key file in this directory instead of the system temp dir
    pub fn with_key_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.key_dir = Some(dir.into());
        self
    }

    /// Environment for every gcloud call: provider overrides cleared
    pub fn environment() -> EnvOverlay {
        provider_environment()
    }

    /// Authenticate against the cluster
    ///
    /// The account is pinned explicitly so the right identity is used when
    /// several are active in the same environment.
    pub async fn authenticate(&self, cluster: &ClusterTarget) -> Result<ClusterSession> {
        info!(cluster = %cluster.name, "setting up cluster authentication");

        let account = cluster
            .account()
            .map_err(|e| KubeError::Authentication(e.to_string()))?;

        let key_file = self.write_key(&cluster.credentials)?;
        let plan = self.plan(cluster, &account, key_file.path());

        let outcome = Sequencer::new(self.runner).execute(&plan).await;
        let removed = key_file.close();
        match &removed {
            Ok(()) => debug!("removed transient service account key"),
            Err(e) => warn!("Failed to remove transient service account key: {}", e),
        }

        outcome.map_err(|e| match e {
            KubeError::StepFailed { .. } | KubeError::Spawn { .. } => {
                KubeError::Authentication(e.to_string())
            }
            other => other,
        })?;
        removed?;

        Ok(ClusterSession {
            account,
            cluster: cluster.name.clone(),
        })
    }

    /// The two gcloud invocations, both fatal
    pub fn plan(&self, cluster: &ClusterTarget, account: &str, key_file: &Path) -> CommandPlan {
        let env = Self::environment();

        vec![
            Invocation::new(Step::ActivateServiceAccount, &self.gcloud, FailurePolicy::Fatal)
                .args([
                    "auth".to_string(),
                    "activate-service-account".to_string(),
                    format!("--key-file={}", key_file.display()),
                ])
                .env(env.clone()),
            Invocation::new(Step::FetchClusterCredentials, &self.gcloud, FailurePolicy::Fatal)
                .args([
                    "container",
                    "clusters",
                    "get-credentials",
                    cluster.name.as_str(),
                    "--zone",
                    cluster.location.as_str(),
                    "--project",
                    cluster.project.as_str(),
                    "--account",
                    account,
                ])
                .env(env),
        ]
        .into_iter()
        .collect()
    }

    fn write_key(&self, credentials: &str) -> Result<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("sa-").suffix(".json");

        let mut file = match &self.key_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(credentials.as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}
