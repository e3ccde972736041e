//! Status reporters

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, StatusError};
use crate::state::{DeploymentState, RepoContext};

/// Media type enabling the extended deployment states
pub const PREVIEW_ACCEPT: &str = "application/vnd.github.ant-man-preview+json";

/// Fire-and-forget sink for deployment lifecycle events
///
/// Implementations must never fail the caller.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn report(&self, state: DeploymentState);
}

#[derive(Debug, Serialize)]
struct StatusBody<'a> {
    state: DeploymentState,
    log_url: &'a str,
    target_url: &'a str,
}

struct Target {
    client: reqwest::Client,
    token: String,
    context: RepoContext,
    deployment_id: u64,
}

/// Reports to the deployment statuses API
///
/// Disabled (every report is a no-op) unless a token, a repository context
/// and a deployment id are all available.
pub struct DeploymentReporter {
    target: Option<Target>,
}

impl DeploymentReporter {
    pub fn new(
        token: Option<String>,
        context: Option<RepoContext>,
        deployment_id: Option<u64>,
    ) -> Result<Self> {
        let (Some(token), Some(context), Some(deployment_id)) =
            (token.filter(|t| !t.is_empty()), context, deployment_id)
        else {
            return Ok(Self::disabled());
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("shipyard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            target: Some(Target {
                client,
                token,
                context,
                deployment_id,
            }),
        })
    }

    /// Reporter that never sends anything
    pub fn disabled() -> Self {
        Self { target: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Send a status, surfacing any error
    pub async fn try_report(&self, state: DeploymentState) -> Result<()> {
        let Some(target) = &self.target else {
            debug!("not setting deployment status");
            return Ok(());
        };

        let url = Url::parse(&target.context.statuses_url(target.deployment_id))?;
        let checks = target.context.checks_url();
        let body = StatusBody {
            state,
            log_url: &checks,
            target_url: &checks,
        };

        let response = target
            .client
            .post(url)
            .bearer_auth(&target.token)
            .header(reqwest::header::ACCEPT, PREVIEW_ACCEPT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StatusError::HttpError {
                status: status.as_u16(),
                message,
            });
        }

        debug!(%state, deployment = target.deployment_id, "deployment status set");
        Ok(())
    }
}

#[async_trait]
impl StatusReporter for DeploymentReporter {
    async fn report(&self, state: DeploymentState) {
        if let Err(e) = self.try_report(state).await {
            warn!("Failed to set deployment status: {}", e);
        }
    }
}

/// Reporter that records states, for testing
#[derive(Clone, Default)]
pub struct RecordingReporter {
    states: Arc<Mutex<Vec<DeploymentState>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// States reported so far
    pub fn states(&self) -> Vec<DeploymentState> {
        self.states.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusReporter for RecordingReporter {
    async fn report(&self, state: DeploymentState) {
        self.states.lock().unwrap().push(state);
    }
}
