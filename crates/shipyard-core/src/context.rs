//! Template rendering context

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::event::DeploymentEvent;
use crate::request::Secrets;

/// Data available to every value-file template
///
/// Built once per run and shared read-only by all renders.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateContext {
    /// Secrets payload (structured, or an opaque string)
    pub secrets: Secrets,

    /// Triggering deployment, `null` when the run was not a deployment
    pub deployment: JsonValue,
}

impl TemplateContext {
    /// Create a context from the resolved secrets and the triggering event
    pub fn new(secrets: Secrets, event: &DeploymentEvent) -> Self {
        Self {
            secrets,
            deployment: event.deployment().cloned().unwrap_or(JsonValue::Null),
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_context() {
        let event = DeploymentEvent::with_deployment(json!({"id": 3, "environment": "prod"}));
        let ctx = TemplateContext::new(Secrets(json!({"api_key": "k"})), &event);

        let value = ctx.to_json();
        assert_eq!(value["secrets"]["api_key"], "k");
        assert_eq!(value["deployment"]["environment"], "prod");
    }

    #[test]
    fn test_context_without_deployment() {
        let ctx = TemplateContext::new(Secrets::default(), &DeploymentEvent::without_deployment());
        assert_eq!(ctx.to_json()["deployment"], JsonValue::Null);
    }
}
