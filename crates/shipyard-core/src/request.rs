//! The typed release request

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};
use crate::release::{CANARY_TRACK, PREVIEW_MARKER, identity};

/// Default package manager executable (helm2 generation)
pub const DEFAULT_ENGINE_BINARY: &str = "helm";

/// Selector for the helm3 generation
pub const HELM3_SELECTOR: &str = "helm3";

/// Service account used by the TTL cleanup job
pub const DEFAULT_TTL_SERVICE_ACCOUNT: &str = "helm-ttl-plugin";

/// Cluster to authenticate against
#[derive(Clone, PartialEq, Eq)]
pub struct ClusterTarget {
    pub project: String,
    pub location: String,
    pub name: String,
    /// Service account key (JSON)
    pub credentials: String,
}

impl ClusterTarget {
    /// Account (`client_email`) embedded in the service account key
    pub fn account(&self) -> Result<String> {
        let key: JsonValue = serde_json::from_str(&self.credentials).map_err(|e| {
            CoreError::InvalidCredentials {
                message: format!("key is not valid JSON: {}", e),
            }
        })?;

        key.get("client_email")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| CoreError::InvalidCredentials {
                message: "key has no client_email".to_string(),
            })
    }
}

impl std::fmt::Debug for ClusterTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterTarget")
            .field("project", &self.project)
            .field("location", &self.location)
            .field("name", &self.name)
            .field("credentials", &"<redacted>")
            .finish()
    }
}

/// Package manager generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineVersion {
    #[default]
    Helm2,
    Helm3,
}

impl EngineVersion {
    /// Only helm3 ships the release TTL plugin
    pub fn supports_ttl(self) -> bool {
        matches!(self, EngineVersion::Helm3)
    }
}

impl std::fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineVersion::Helm2 => write!(f, "helm2"),
            EngineVersion::Helm3 => write!(f, "helm3"),
        }
    }
}

/// Package manager to invoke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    pub version: EngineVersion,
    /// Executable name or path
    pub binary: String,
}

impl Engine {
    /// Build from the `helm` input; the selector doubles as the executable name
    pub fn from_selector(selector: &str) -> Self {
        let binary = if selector.is_empty() {
            DEFAULT_ENGINE_BINARY
        } else {
            selector
        };
        let version = if binary == HELM3_SELECTOR {
            EngineVersion::Helm3
        } else {
            EngineVersion::Helm2
        };
        Self {
            version,
            binary: binary.to_string(),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::from_selector(DEFAULT_ENGINE_BINARY)
    }
}

/// Operation to perform on the release
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Task {
    #[default]
    Upgrade,
    Remove,
}

impl Task {
    /// Parse the `task` input; anything but `remove` upgrades
    pub fn parse(task: &str) -> Self {
        if task == "remove" {
            Task::Remove
        } else {
            Task::Upgrade
        }
    }
}

/// Release expiry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Ttl {
    #[default]
    Disabled,
    /// Expression handed to the TTL plugin (e.g. `7d`)
    Expires(String),
}

impl Ttl {
    /// Parse the `ttl` input; the literal `false` disables expiry
    pub fn parse(ttl: &str) -> Self {
        if ttl.is_empty() || ttl == "false" {
            Ttl::Disabled
        } else {
            Ttl::Expires(ttl.to_string())
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Ttl::Expires(_))
    }
}

/// Template secrets, never printed
#[derive(Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Secrets(pub JsonValue);

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secrets(<redacted>)")
    }
}

/// Everything needed to run one release operation
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    pub cluster: ClusterTarget,
    pub track: String,
    pub app_name: String,
    pub namespace: String,
    /// Chart reference with the bundled alias already expanded
    pub chart: String,
    pub chart_version: Option<String>,
    /// Contents of the generated values file
    pub values: String,
    /// User value files, in override order
    pub value_files: Vec<String>,
    pub task: Task,
    pub app_version: Option<String>,
    pub remove_canary: bool,
    pub engine: Engine,
    pub timeout: Option<String>,
    pub repository: Option<String>,
    pub dry_run: bool,
    pub secrets: Secrets,
    pub atomic: bool,
    pub ttl: Ttl,
    pub service_account: String,
}

impl ReleaseRequest {
    /// Release name derived from application name and track
    pub fn release_name(&self) -> String {
        identity(&self.app_name, &self.track)
    }

    pub fn is_canary(&self) -> bool {
        self.track == CANARY_TRACK
    }

    /// Whether an expiry will be attached to the release
    pub fn ttl_applies(&self) -> bool {
        self.engine.version.supports_ttl() && self.ttl.is_enabled()
    }

    /// Check cross-field invariants
    ///
    /// Expiring releases must be preview releases so a stable release can
    /// never be scheduled for deletion.
    pub fn validate(&self) -> Result<()> {
        let release = self.release_name();
        if self.ttl_applies() && !release.contains(PREVIEW_MARKER) {
            return Err(CoreError::TtlWithoutPreviewRelease {
                release,
                marker: PREVIEW_MARKER,
            });
        }
        Ok(())
    }
}
