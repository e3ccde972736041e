//! Environment overlays for external invocations
//!
//! Instead of mutating the process environment, every invocation carries the
//! variables it needs set and the ones it needs cleared.

use std::collections::{BTreeMap, BTreeSet};

use shipyard_core::EngineVersion;

/// Variables to set and clear on a child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    set: BTreeMap<String, String>,
    unset: BTreeSet<String>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable (cancels an earlier unset of the same name)
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        self.unset.remove(&key);
        self.set.insert(key, value.into());
        self
    }

    /// Clear a variable inherited from the parent process
    pub fn unset(&mut self, key: impl Into<String>) -> &mut Self {
        let key = key.into();
        self.set.remove(&key);
        self.unset.insert(key);
        self
    }

    /// Layer another overlay on top of this one
    pub fn merge(&mut self, other: &EnvOverlay) {
        for key in &other.unset {
            self.unset(key.clone());
        }
        for (key, value) in &other.set {
            self.set(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.set.get(key).map(String::as_str)
    }

    pub fn is_unset(&self, key: &str) -> bool {
        self.unset.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Apply to a command about to be spawned
    pub fn apply(&self, command: &mut tokio::process::Command) {
        for key in &self.unset {
            command.env_remove(key);
        }
        command.envs(&self.set);
    }
}

/// Variables that would shadow the explicit key, project or account
pub const PROVIDER_OVERRIDE_VARS: [&str; 10] = [
    "CLOUDSDK_AUTH_CREDENTIAL_FILE_OVERRIDE",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "GOOGLE_GHA_CREDS_PATH",
    "CLOUDSDK_CORE_PROJECT",
    "CLOUDSDK_PROJECT",
    "GCLOUD_PROJECT",
    "GCP_PROJECT",
    "GOOGLE_CLOUD_PROJECT",
    "CLOUDSDK_METRICS_ENVIRONMENT",
    "CLOUDSDK_METRICS_ENVIRONMENT_VERSION",
];

/// Overlay clearing every provider override
///
/// Applies to every invocation of the run: the kubeconfig written by gcloud
/// calls back into gcloud, so helm must see the same provider configuration.
pub fn provider_environment() -> EnvOverlay {
    let mut env = EnvOverlay::new();
    for var in PROVIDER_OVERRIDE_VARS {
        env.unset(var);
    }
    env
}

/// Provider overrides cleared, plus the data directories the package manager
/// expects inside the runner image
///
/// See <https://helm.sh/docs/faq/#xdg-base-directory-support>.
pub fn engine_environment(version: EngineVersion) -> EnvOverlay {
    let mut env = provider_environment();
    match version {
        EngineVersion::Helm3 => {
            env.set("XDG_DATA_HOME", "/root/.helm/")
                .set("XDG_CACHE_HOME", "/root/.helm/")
                .set("XDG_CONFIG_HOME", "/root/.helm/")
                .set("HELM_PLUGINS", "/root/.local/share/helm/plugins")
                .set("HELM_DATA_HOME", "/root/.local/share/helm")
                .set("HELM_CACHE_HOME", "/root/.cache/helm")
                .set("HELM_CONFIG_HOME", "/root/.config/helm");
        }
        EngineVersion::Helm2 => {
            env.set("HELM_HOME", "/root/.helm/");
        }
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helm3_environment() {
        let env = engine_environment(EngineVersion::Helm3);
        assert_eq!(env.get("HELM_PLUGINS"), Some("/root/.local/share/helm/plugins"));
        assert_eq!(env.get("XDG_CONFIG_HOME"), Some("/root/.helm/"));
        assert!(env.get("HELM_HOME").is_none());
    }

    #[test]
    fn test_helm2_environment() {
        let env = engine_environment(EngineVersion::Helm2);
        assert_eq!(env.get("HELM_HOME"), Some("/root/.helm/"));
        assert!(env.get("HELM_PLUGINS").is_none());
    }

    #[test]
    fn test_engine_environment_clears_provider_overrides() {
        for version in [EngineVersion::Helm2, EngineVersion::Helm3] {
            let env = engine_environment(version);
            for var in PROVIDER_OVERRIDE_VARS {
                assert!(env.is_unset(var), "{} not cleared for {}", var, version);
            }
        }
    }

    #[test]
    fn test_set_and_unset_override_each_other() {
        let mut env = EnvOverlay::new();
        env.unset("GCLOUD_PROJECT");
        assert!(env.is_unset("GCLOUD_PROJECT"));

        env.set("GCLOUD_PROJECT", "p");
        assert!(!env.is_unset("GCLOUD_PROJECT"));
        assert_eq!(env.get("GCLOUD_PROJECT"), Some("p"));

        env.unset("GCLOUD_PROJECT");
        assert!(env.get("GCLOUD_PROJECT").is_none());
    }

    #[test]
    fn test_merge() {
        let mut base = engine_environment(EngineVersion::Helm2);
        let mut extra = EnvOverlay::new();
        extra.set("KUBECONFIG", "./kubeconfig.yml").unset("HELM_HOME");

        base.merge(&extra);
        assert_eq!(base.get("KUBECONFIG"), Some("./kubeconfig.yml"));
        assert!(base.is_unset("HELM_HOME"));
    }
}
