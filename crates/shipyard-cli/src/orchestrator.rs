//! One release run, from raw inputs to terminal status

use std::path::{Path, PathBuf};

use shipyard_core::{
    DeclaredInputs, DeploymentEvent, InputResolver, ReleaseRequest, Task, TemplateContext,
};
use shipyard_engine::ValueFileRenderer;
use shipyard_kube::{
    Authenticator, CommandRunner, ExecutionReport, GCLOUD_BINARY, KUBECONFIG_FILE_NAME,
    ReleasePlanner, Sequencer, write_kubeconfig, write_values_file,
};
use shipyard_status::{DeploymentState, StatusReporter};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Where the run happens and which tools it uses
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the generated files; the package manager runs here
    pub workdir: PathBuf,
    pub gcloud: String,
    /// Inline kubeconfig contents to write before running the plan
    pub kubeconfig: Option<String>,
    /// Directory for the transient key file (system temp dir when unset)
    pub key_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            gcloud: GCLOUD_BINARY.to_string(),
            kubeconfig: None,
            key_dir: None,
        }
    }
}

/// What a successful run did
#[derive(Debug)]
pub struct RunSummary {
    pub release: String,
    pub namespace: String,
    pub state: DeploymentState,
    pub report: ExecutionReport,
}

/// Drives one release operation
pub struct Orchestrator<'a> {
    runner: &'a dyn CommandRunner,
    reporter: &'a dyn StatusReporter,
    settings: Settings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        reporter: &'a dyn StatusReporter,
        settings: Settings,
    ) -> Self {
        Self {
            runner,
            reporter,
            settings,
        }
    }

    /// Run the release and report its terminal state
    ///
    /// Any failure is reported as `failure`, except the expiry invariant
    /// which aborts before anything touched the cluster.
    pub async fn run(
        &self,
        declared: &DeclaredInputs,
        event: &DeploymentEvent,
    ) -> Result<RunSummary> {
        match self.try_run(declared, event).await {
            Ok(summary) => {
                self.reporter.report(summary.state).await;
                Ok(summary)
            }
            Err(err) => {
                if err.reports_failure() {
                    self.reporter.report(DeploymentState::Failure).await;
                }
                Err(err)
            }
        }
    }

    async fn try_run(
        &self,
        declared: &DeclaredInputs,
        event: &DeploymentEvent,
    ) -> Result<RunSummary> {
        self.reporter.report(DeploymentState::Pending).await;

        let request = InputResolver::new(declared, event).resolve()?;
        log_parameters(&request);
        request.validate()?;

        let session = Authenticator::new(self.runner)
            .with_gcloud(&self.settings.gcloud)
            .with_key_dir(self.key_dir())
            .authenticate(&request.cluster)
            .await?;
        info!(account = %session.account, cluster = %session.cluster, "authenticated");

        let workdir = &self.settings.workdir;
        let mut planner = ReleasePlanner::new(&request);
        if let Some(contents) = self.settings.kubeconfig.as_deref().filter(|c| !c.is_empty()) {
            let path = write_kubeconfig(workdir, contents).await?;
            debug!(path = %path.display(), "wrote kubeconfig");
            planner = planner.with_kubeconfig(format!("./{}", KUBECONFIG_FILE_NAME));
        }

        let values_path = write_values_file(workdir, &request.values).await?;
        debug!(path = %values_path.display(), "wrote generated values");

        let files = render_targets(workdir, &request.value_files, values_path);
        let context = TemplateContext::new(request.secrets.clone(), event);
        ValueFileRenderer::lenient()?
            .render_files(&files, &context)
            .await?;

        let plan = planner.plan();
        info!("release plan for {}:\n{}", request.release_name(), plan);

        let report = Sequencer::new(self.runner).execute(&plan).await?;
        let ignored = report.ignored_failures().count();
        if ignored > 0 {
            warn!("{} best-effort step(s) failed and were ignored", ignored);
        }

        let state = match request.task {
            Task::Remove => DeploymentState::Inactive,
            Task::Upgrade => DeploymentState::Success,
        };

        Ok(RunSummary {
            release: request.release_name(),
            namespace: request.namespace.clone(),
            state,
            report,
        })
    }

    fn key_dir(&self) -> PathBuf {
        self.settings
            .key_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Files to render: user value files in order, the generated values file last
///
/// Relative paths are resolved against the working directory, where the
/// package manager runs.
fn render_targets(workdir: &Path, value_files: &[String], generated: PathBuf) -> Vec<PathBuf> {
    value_files
        .iter()
        .map(|f| workdir.join(f))
        .chain(std::iter::once(generated))
        .collect()
}

fn log_parameters(request: &ReleaseRequest) {
    debug!("param: clusterproject = {:?}", request.cluster.project);
    debug!("param: clusterlocation = {:?}", request.cluster.location);
    debug!("param: clustername = {:?}", request.cluster.name);
    debug!("param: clustersajson = <redacted>");
    debug!("param: track = {:?}", request.track);
    debug!("param: release = {:?}", request.app_name);
    debug!("param: namespace = {:?}", request.namespace);
    debug!("param: chart = {:?}", request.chart);
    debug!("param: chart_version = {:?}", request.chart_version);
    debug!("param: values = {:?}", request.values);
    debug!("param: task = {:?}", request.task);
    debug!("param: version = {:?}", request.app_version);
    debug!("param: value_files = {:?}", request.value_files);
    debug!("param: remove_canary = {}", request.remove_canary);
    debug!("param: helm = {:?}", request.engine);
    debug!("param: timeout = {:?}", request.timeout);
    debug!("param: repository = {:?}", request.repository);
    debug!("param: dry-run = {}", request.dry_run);
    debug!("param: secrets = {:?}", request.secrets);
    debug!("param: atomic = {}", request.atomic);
    debug!("param: ttl = {:?}", request.ttl);
    debug!("param: service_account = {:?}", request.service_account);
}
