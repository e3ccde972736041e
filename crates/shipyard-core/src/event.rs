//! Triggering event payload

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::Result;
use crate::input::{RawInput, is_truthy};

/// The event that triggered this run
///
/// Only the `deployment` object matters: it identifies the deployment to
/// report status against and may carry per-deployment input overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentEvent {
    #[serde(default)]
    pub deployment: Option<JsonValue>,
}

impl DeploymentEvent {
    /// Load an event payload file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse an event payload
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Event for a run that was not triggered by a deployment
    pub fn without_deployment() -> Self {
        Self::default()
    }

    /// Wrap a deployment object directly
    pub fn with_deployment(deployment: JsonValue) -> Self {
        Self {
            deployment: Some(deployment),
        }
    }

    pub fn deployment(&self) -> Option<&JsonValue> {
        self.deployment.as_ref()
    }

    /// Numeric id of the triggering deployment
    pub fn deployment_id(&self) -> Option<u64> {
        self.deployment()?.get("id")?.as_u64()
    }

    /// Per-deployment override for an input
    ///
    /// `deployment.payload.<name>` wins over `deployment.<name>`; empty or
    /// falsy values do not override anything.
    pub fn override_for(&self, name: &str) -> Option<RawInput> {
        let deployment = self.deployment()?;

        let from_payload = payload_object(deployment).and_then(|p| p.get(name).cloned());
        let from_deployment = deployment.get(name).cloned();

        [from_payload, from_deployment]
            .into_iter()
            .flatten()
            .find(is_truthy)
            .map(RawInput::from_json)
    }
}

/// Deployment payloads may arrive either as an object or as a JSON-encoded string
fn payload_object(deployment: &JsonValue) -> Option<JsonValue> {
    match deployment.get("payload")? {
        JsonValue::String(s) => serde_json::from_str(s).ok(),
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_without_deployment() {
        let event = DeploymentEvent::from_json(r#"{"ref": "main"}"#).unwrap();
        assert!(event.deployment().is_none());
        assert!(event.deployment_id().is_none());
        assert!(event.override_for("track").is_none());
    }

    #[test]
    fn test_payload_override_wins() {
        let event = DeploymentEvent::with_deployment(json!({
            "id": 17,
            "track": "canary",
            "payload": { "track": "pr-3" }
        }));

        assert_eq!(event.deployment_id(), Some(17));
        assert_eq!(event.override_for("track"), Some(RawInput::from("pr-3")));
    }

    #[test]
    fn test_deployment_field_used_when_payload_missing_key() {
        let event = DeploymentEvent::with_deployment(json!({
            "id": 1,
            "namespace": "prod",
            "payload": {}
        }));
        assert_eq!(event.override_for("namespace"), Some(RawInput::from("prod")));
    }

    #[test]
    fn test_empty_override_ignored() {
        let event = DeploymentEvent::with_deployment(json!({
            "id": 1,
            "payload": { "track": "" , "atomic": false }
        }));
        assert!(event.override_for("track").is_none());
        assert!(event.override_for("atomic").is_none());
    }

    #[test]
    fn test_string_payload_is_decoded() {
        let event = DeploymentEvent::with_deployment(json!({
            "id": 1,
            "payload": "{\"values\": {\"replicas\": 3}}"
        }));
        assert_eq!(
            event.override_for("values"),
            Some(RawInput::Structured(json!({"replicas": 3})))
        );
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, r#"{"deployment": {"id": 99, "payload": {}}}"#).unwrap();

        let event = DeploymentEvent::from_file(&path).unwrap();
        assert_eq!(event.deployment_id(), Some(99));
    }
}
