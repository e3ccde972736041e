//! Deployment states and repository context

use serde::{Deserialize, Serialize};

/// Default REST API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default web root, used for log links
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Lifecycle state of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    Pending,
    Success,
    Failure,
    Inactive,
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Inactive => "inactive",
        };
        write!(f, "{}", s)
    }
}

/// Repository and commit the run belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    pub owner: String,
    pub repo: String,
    pub sha: String,
    pub api_url: String,
    pub server_url: String,
}

impl RepoContext {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            sha: sha.into(),
            api_url: DEFAULT_API_URL.to_string(),
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }

    /// Build from an `owner/repo` slug
    pub fn from_slug(slug: &str, sha: impl Into<String>) -> Option<Self> {
        let (owner, repo) = slug.split_once('/')?;
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(Self::new(owner, repo, sha))
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    /// Link to the checks of the commit being deployed
    pub fn checks_url(&self) -> String {
        format!(
            "{}/{}/{}/commit/{}/checks",
            self.server_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.sha
        )
    }

    /// Endpoint creating statuses for a deployment
    pub fn statuses_url(&self, deployment_id: u64) -> String {
        format!(
            "{}/repos/{}/{}/deployments/{}/statuses",
            self.api_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            deployment_id
        )
    }
}
