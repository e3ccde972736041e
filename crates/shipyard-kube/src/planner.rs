//! Release command planning
//!
//! Turns a [`ReleaseRequest`] into the ordered package-manager invocations
//! for this run. Planning is pure: nothing is executed here.

use shipyard_core::{EngineVersion, ReleaseRequest, Task, Ttl, canary_release};

use crate::artifacts::VALUES_FILE_NAME;
use crate::env::{EnvOverlay, engine_environment};
use crate::plan::{CommandPlan, FailurePolicy, Invocation, Step};

/// Builds the command plan for a release request
pub struct ReleasePlanner<'a> {
    request: &'a ReleaseRequest,
    values_file: String,
    env: EnvOverlay,
}

impl<'a> ReleasePlanner<'a> {
    pub fn new(request: &'a ReleaseRequest) -> Self {
        Self {
            request,
            values_file: format!("./{}", VALUES_FILE_NAME),
            env: engine_environment(request.engine.version),
        }
    }

    /// Reference the generated values file at a different path
    pub fn with_values_file(mut self, path: impl Into<String>) -> Self {
        self.values_file = path.into();
        self
    }

    /// Point every invocation at an explicit kubeconfig
    pub fn with_kubeconfig(mut self, path: impl Into<String>) -> Self {
        self.env.set("KUBECONFIG", path);
        self
    }

    /// Environment overlay shared by every planned invocation
    pub fn environment(&self) -> &EnvOverlay {
        &self.env
    }

    /// Build the full plan
    ///
    /// `remove` runs only the delete path (preceded by a best-effort TTL unset
    /// on helm3). Otherwise an optional canary cleanup, the upgrade, and the
    /// TTL assignment when expiry is enabled.
    pub fn plan(&self) -> CommandPlan {
        let request = self.request;
        let release = request.release_name();
        let mut plan = CommandPlan::new();

        match request.task {
            Task::Remove => {
                if request.engine.version.supports_ttl() {
                    plan.push(self.invocation(
                        Step::UnsetTtl,
                        FailurePolicy::Ignored,
                        self.ttl_unset_args(&release),
                    ));
                }
                plan.push(self.invocation(
                    Step::Delete,
                    FailurePolicy::Ignored,
                    self.delete_args(&release),
                ));
            }
            Task::Upgrade => {
                if request.remove_canary {
                    let canary = canary_release(&request.app_name);
                    plan.push(self.invocation(
                        Step::RemoveCanary,
                        FailurePolicy::Ignored,
                        self.delete_args(&canary),
                    ));
                }

                plan.push(self.invocation(
                    Step::Upgrade,
                    FailurePolicy::Fatal,
                    self.upgrade_args(),
                ));

                if request.ttl_applies()
                    && let Ttl::Expires(ttl) = &request.ttl
                {
                    plan.push(self.invocation(
                        Step::SetTtl,
                        FailurePolicy::Fatal,
                        self.ttl_set_args(&release, ttl),
                    ));
                }
            }
        }

        plan
    }

    /// Arguments of the upgrade/install invocation
    ///
    /// User value files come first and the generated values file last, so the
    /// generated values win on conflicting keys.
    pub fn upgrade_args(&self) -> Vec<String> {
        let request = self.request;
        let mut args = vec![
            "upgrade".to_string(),
            request.release_name(),
            request.chart.clone(),
            "--install".to_string(),
            format!("--namespace={}", request.namespace),
        ];

        if request.dry_run {
            args.push("--dry-run".to_string());
        }
        if !request.app_name.is_empty() {
            args.push(format!("--set=app.name={}", request.app_name));
        }
        if let Some(version) = &request.app_version {
            args.push(format!("--set=app.version={}", version));
        }
        if let Some(chart_version) = &request.chart_version {
            args.push(format!("--version={}", chart_version));
        }
        if let Some(timeout) = &request.timeout {
            args.push(format!("--timeout={}", timeout));
        }
        if let Some(repository) = &request.repository {
            args.push(format!("--repo={}", repository));
        }

        args.extend(request.value_files.iter().map(|f| format!("--values={}", f)));
        args.push(format!("--values={}", self.values_file));

        // Canary releases are published without traffic: the stable service
        // routes to them.
        if request.is_canary() {
            args.push("--set=service.enabled=false".to_string());
            args.push("--set=ingress.enabled=false".to_string());
        }

        if request.atomic {
            args.push("--atomic".to_string());
        }

        args
    }

    /// Arguments deleting a release, in the syntax of the engine generation
    pub fn delete_args(&self, release: &str) -> Vec<String> {
        match self.request.engine.version {
            EngineVersion::Helm3 => vec![
                "delete".to_string(),
                "-n".to_string(),
                self.request.namespace.clone(),
                release.to_string(),
            ],
            EngineVersion::Helm2 => vec![
                "delete".to_string(),
                "--purge".to_string(),
                release.to_string(),
            ],
        }
    }

    /// Arguments attaching an expiry to a release
    pub fn ttl_set_args(&self, release: &str, ttl: &str) -> Vec<String> {
        vec![
            format!("--namespace={}", self.request.namespace),
            "release".to_string(),
            "ttl".to_string(),
            release.to_string(),
            format!("--service-account={}", self.request.service_account),
            format!("--set={}", ttl),
        ]
    }

    /// Arguments removing an expiry from a release
    pub fn ttl_unset_args(&self, release: &str) -> Vec<String> {
        vec![
            format!("--namespace={}", self.request.namespace),
            "release".to_string(),
            "ttl".to_string(),
            release.to_string(),
            "--unset".to_string(),
        ]
    }

    fn invocation(&self, step: Step, policy: FailurePolicy, args: Vec<String>) -> Invocation {
        Invocation::new(step, self.request.engine.binary.clone(), policy)
            .args(args)
            .env(self.env.clone())
    }
}
