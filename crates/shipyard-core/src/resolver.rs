//! Input resolution
//!
//! Each input is looked up in order: the per-deployment override carried by
//! the triggering event, then the value declared for this invocation, then
//! the documented default.

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::event::DeploymentEvent;
use crate::input::RawInput;
use crate::release::{STABLE_TRACK, chart_reference};
use crate::request::{
    ClusterTarget, DEFAULT_TTL_SERVICE_ACCOUNT, Engine, ReleaseRequest, Secrets, Task, Ttl,
};

/// Input names
pub mod names {
    pub const CLUSTER_PROJECT: &str = "clusterproject";
    pub const CLUSTER_LOCATION: &str = "clusterlocation";
    pub const CLUSTER_NAME: &str = "clustername";
    pub const CLUSTER_SA_JSON: &str = "clustersajson";
    pub const TRACK: &str = "track";
    pub const RELEASE: &str = "release";
    pub const NAMESPACE: &str = "namespace";
    pub const CHART: &str = "chart";
    pub const CHART_VERSION: &str = "chart_version";
    pub const VALUES: &str = "values";
    pub const TASK: &str = "task";
    pub const VERSION: &str = "version";
    pub const VALUE_FILES: &str = "value_files";
    pub const REMOVE_CANARY: &str = "remove_canary";
    pub const HELM: &str = "helm";
    pub const TIMEOUT: &str = "timeout";
    pub const REPOSITORY: &str = "repository";
    pub const DRY_RUN: &str = "dry-run";
    pub const SECRETS: &str = "secrets";
    pub const ATOMIC: &str = "atomic";
    pub const TTL: &str = "ttl";
    pub const SERVICE_ACCOUNT: &str = "service_account";
}

/// Values declared for this invocation, keyed by input name
///
/// Empty strings are treated as "not declared".
#[derive(Debug, Clone, Default)]
pub struct DeclaredInputs {
    inputs: BTreeMap<String, String>,
}

impl DeclaredInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an input; `None` and empty values are skipped
    pub fn set(&mut self, name: &str, value: Option<String>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.inputs.insert(name.to_string(), value);
        }
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, Some(value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).map(String::as_str)
    }
}

/// Resolves declared inputs and deployment overrides into a [`ReleaseRequest`]
pub struct InputResolver<'a> {
    declared: &'a DeclaredInputs,
    event: &'a DeploymentEvent,
}

impl<'a> InputResolver<'a> {
    pub fn new(declared: &'a DeclaredInputs, event: &'a DeploymentEvent) -> Self {
        Self { declared, event }
    }

    /// Raw value of an input: deployment override first, then the declared value
    pub fn raw(&self, name: &str) -> Option<RawInput> {
        self.event
            .override_for(name)
            .or_else(|| self.declared_raw(name))
    }

    /// Raw declared value, ignoring deployment overrides
    pub fn declared_raw(&self, name: &str) -> Option<RawInput> {
        self.declared.get(name).map(RawInput::from)
    }

    /// Resolved string value, `None` when absent or empty
    pub fn text(&self, name: &str) -> Option<String> {
        self.raw(name)
            .map(RawInput::into_text)
            .filter(|s| !s.is_empty())
    }

    /// Resolved string value or a default
    pub fn text_or(&self, name: &str, default: &str) -> String {
        self.text(name).unwrap_or_else(|| default.to_string())
    }

    /// Resolved string value that must be present
    pub fn required(&self, name: &str) -> Result<String> {
        self.text(name).ok_or_else(|| CoreError::MissingInput {
            name: name.to_string(),
        })
    }

    /// Resolve every input into a release request
    ///
    /// `dry-run` and `secrets` are only ever taken from the declared inputs;
    /// a deployment payload cannot inject them.
    pub fn resolve(&self) -> Result<ReleaseRequest> {
        let cluster = ClusterTarget {
            project: self.required(names::CLUSTER_PROJECT)?,
            location: self.required(names::CLUSTER_LOCATION)?,
            name: self.required(names::CLUSTER_NAME)?,
            credentials: self.required(names::CLUSTER_SA_JSON)?,
        };

        let app_name = self.required(names::RELEASE)?;
        let namespace = self.required(names::NAMESPACE)?;
        let chart = chart_reference(&self.required(names::CHART)?);

        let values = match self.raw(names::VALUES) {
            Some(raw) => raw.into_values_document()?,
            None => RawInput::from("").into_values_document()?,
        };

        let value_files = self
            .raw(names::VALUE_FILES)
            .map(RawInput::into_file_list)
            .unwrap_or_default();

        let secrets = self
            .declared_raw(names::SECRETS)
            .map(RawInput::into_json)
            .unwrap_or_default();

        Ok(ReleaseRequest {
            cluster,
            track: self.text_or(names::TRACK, STABLE_TRACK),
            app_name,
            namespace,
            chart,
            chart_version: self.text(names::CHART_VERSION),
            values,
            value_files,
            task: Task::parse(&self.text_or(names::TASK, "")),
            app_version: self.text(names::VERSION),
            remove_canary: self.flag(names::REMOVE_CANARY).unwrap_or(false),
            engine: Engine::from_selector(&self.text_or(names::HELM, "")),
            timeout: self.text(names::TIMEOUT),
            repository: self.text(names::REPOSITORY),
            dry_run: self
                .declared_raw(names::DRY_RUN)
                .map(RawInput::into_flag)
                .unwrap_or(false),
            secrets: Secrets(secrets),
            atomic: self.flag(names::ATOMIC).unwrap_or(true),
            ttl: Ttl::parse(&self.text_or(names::TTL, "false")),
            service_account: self.text_or(names::SERVICE_ACCOUNT, DEFAULT_TTL_SERVICE_ACCOUNT),
        })
    }

    fn flag(&self, name: &str) -> Option<bool> {
        self.raw(name).map(RawInput::into_flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::EngineVersion;
    use serde_json::json;

    fn base_inputs() -> DeclaredInputs {
        DeclaredInputs::new()
            .with(names::CLUSTER_PROJECT, "proj")
            .with(names::CLUSTER_LOCATION, "europe-west1-b")
            .with(names::CLUSTER_NAME, "main")
            .with(names::CLUSTER_SA_JSON, r#"{"client_email": "ci@proj"}"#)
            .with(names::RELEASE, "svc")
            .with(names::NAMESPACE, "ns")
            .with(names::CHART, "app")
    }

    #[test]
    fn test_defaults() {
        let inputs = base_inputs();
        let event = DeploymentEvent::without_deployment();
        let request = InputResolver::new(&inputs, &event).resolve().unwrap();

        assert_eq!(request.track, "stable");
        assert_eq!(request.release_name(), "svc");
        assert_eq!(request.chart, "/usr/src/charts/app");
        assert_eq!(request.values, "{}");
        assert_eq!(request.task, Task::Upgrade);
        assert_eq!(request.engine.version, EngineVersion::Helm2);
        assert_eq!(request.engine.binary, "helm");
        assert!(request.atomic);
        assert!(!request.dry_run);
        assert!(!request.remove_canary);
        assert_eq!(request.ttl, Ttl::Disabled);
        assert_eq!(request.service_account, "helm-ttl-plugin");
        assert!(request.value_files.is_empty());
        assert!(request.chart_version.is_none());
    }

    #[test]
    fn test_missing_required_input_is_named() {
        let inputs = DeclaredInputs::new()
            .with(names::CLUSTER_PROJECT, "proj")
            .with(names::CLUSTER_LOCATION, "loc")
            .with(names::CLUSTER_NAME, "main")
            .with(names::CLUSTER_SA_JSON, "{}")
            .with(names::RELEASE, "svc")
            .with(names::CHART, "app");
        let event = DeploymentEvent::without_deployment();

        let err = InputResolver::new(&inputs, &event).resolve().unwrap_err();
        match err {
            CoreError::MissingInput { name } => assert_eq!(name, "namespace"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_required_input_supplied_by_deployment() {
        let inputs = DeclaredInputs::new()
            .with(names::CLUSTER_PROJECT, "proj")
            .with(names::CLUSTER_LOCATION, "loc")
            .with(names::CLUSTER_NAME, "main")
            .with(names::CLUSTER_SA_JSON, "{}")
            .with(names::CHART, "app")
            .with(names::NAMESPACE, "ns");
        let event = DeploymentEvent::with_deployment(json!({
            "id": 5,
            "payload": { "release": "from-payload" }
        }));

        let request = InputResolver::new(&inputs, &event).resolve().unwrap();
        assert_eq!(request.app_name, "from-payload");
    }

    #[test]
    fn test_deployment_override_takes_precedence() {
        let inputs = base_inputs().with(names::TRACK, "stable");
        let event = DeploymentEvent::with_deployment(json!({
            "id": 5,
            "payload": {
                "track": "canary",
                "values": { "replicas": 1 },
                "value_files": ["a.yml", "b.yml"]
            }
        }));

        let request = InputResolver::new(&inputs, &event).resolve().unwrap();
        assert_eq!(request.release_name(), "svc-canary");
        assert!(request.is_canary());
        assert_eq!(request.values.trim(), "replicas: 1");
        assert_eq!(request.value_files, vec!["a.yml", "b.yml"]);
    }

    #[test]
    fn test_secrets_and_dry_run_ignore_deployment() {
        let inputs = base_inputs()
            .with(names::SECRETS, r#"{"db": "pw"}"#)
            .with(names::DRY_RUN, "true");
        let event = DeploymentEvent::with_deployment(json!({
            "id": 5,
            "payload": { "secrets": {"db": "evil"}, "dry-run": false }
        }));

        let request = InputResolver::new(&inputs, &event).resolve().unwrap();
        assert_eq!(request.secrets.0, json!({"db": "pw"}));
        assert!(request.dry_run);
    }

    #[test]
    fn test_atomic_accepts_explicit_disable() {
        let event = DeploymentEvent::without_deployment();

        let inputs = base_inputs().with(names::ATOMIC, "false");
        let request = InputResolver::new(&inputs, &event).resolve().unwrap();
        assert!(!request.atomic);

        let inputs = base_inputs().with(names::ATOMIC, "true");
        let request = InputResolver::new(&inputs, &event).resolve().unwrap();
        assert!(request.atomic);
    }

    #[test]
    fn test_engine_ttl_and_task() {
        let inputs = base_inputs()
            .with(names::HELM, "helm3")
            .with(names::TTL, "7d")
            .with(names::TASK, "remove")
            .with(names::SERVICE_ACCOUNT, "custom-sa")
            .with(names::TRACK, "pr-12");
        let event = DeploymentEvent::without_deployment();

        let request = InputResolver::new(&inputs, &event).resolve().unwrap();
        assert_eq!(request.engine.version, EngineVersion::Helm3);
        assert_eq!(request.ttl, Ttl::Expires("7d".to_string()));
        assert_eq!(request.task, Task::Remove);
        assert_eq!(request.service_account, "custom-sa");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_optional_flags_resolved() {
        let inputs = base_inputs()
            .with(names::CHART_VERSION, "1.2.3")
            .with(names::VERSION, "abc123")
            .with(names::TIMEOUT, "600")
            .with(names::REPOSITORY, "https://charts.example.com")
            .with(names::REMOVE_CANARY, "true")
            .with(names::VALUE_FILES, "./deploy/prod.yml");
        let event = DeploymentEvent::without_deployment();

        let request = InputResolver::new(&inputs, &event).resolve().unwrap();
        assert_eq!(request.chart_version.as_deref(), Some("1.2.3"));
        assert_eq!(request.app_version.as_deref(), Some("abc123"));
        assert_eq!(request.timeout.as_deref(), Some("600"));
        assert_eq!(request.repository.as_deref(), Some("https://charts.example.com"));
        assert!(request.remove_canary);
        assert_eq!(request.value_files, vec!["./deploy/prod.yml"]);
    }

    #[test]
    fn test_declared_empty_is_absent() {
        let mut inputs = base_inputs();
        inputs.set(names::TRACK, Some(String::new()));
        assert!(inputs.get(names::TRACK).is_none());
    }
}
