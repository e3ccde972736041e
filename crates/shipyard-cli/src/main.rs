//! Shipyard - release orchestrator for helm charts on GKE
//!
//! Runs one release operation per invocation: authenticate against the
//! cluster, render value files, run the package manager, report the outcome
//! to the deployment API.

use clap::Parser;
use console::style;
use std::path::PathBuf;
use tracing::{Level, debug, warn};
use tracing_subscriber::EnvFilter;

use shipyard_core::{DeclaredInputs, DeploymentEvent, resolver::names};
use shipyard_kube::{GCLOUD_BINARY, ProcessRunner};
use shipyard_status::{DeploymentReporter, DeploymentState, RepoContext};
use shipyard_status::state::{DEFAULT_API_URL, DEFAULT_SERVER_URL};

mod error;
mod exit_codes;
mod orchestrator;

use error::{CliError, Result};
use orchestrator::{Orchestrator, RunSummary, Settings};

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(author = "Shipyard Contributors")]
#[command(version)]
#[command(about = "Deploy a helm chart to a GKE cluster and report the outcome", long_about = None)]
struct Cli {
    /// GCP project of the cluster
    #[arg(long, env = "INPUT_CLUSTERPROJECT")]
    clusterproject: Option<String>,

    /// Zone or region of the cluster
    #[arg(long, env = "INPUT_CLUSTERLOCATION")]
    clusterlocation: Option<String>,

    /// Cluster name
    #[arg(long, env = "INPUT_CLUSTERNAME")]
    clustername: Option<String>,

    /// Service account key (JSON)
    #[arg(long, env = "INPUT_CLUSTERSAJSON", hide_env_values = true)]
    clustersajson: Option<String>,

    /// Release track (stable, canary, ...)
    #[arg(long, env = "INPUT_TRACK")]
    track: Option<String>,

    /// Application name; the release name is derived from it and the track
    #[arg(long, env = "INPUT_RELEASE")]
    release: Option<String>,

    /// Kubernetes namespace
    #[arg(long, env = "INPUT_NAMESPACE")]
    namespace: Option<String>,

    /// Chart reference (`app` selects the bundled chart)
    #[arg(long, env = "INPUT_CHART")]
    chart: Option<String>,

    /// Chart version
    #[arg(long, env = "INPUT_CHART-VERSION")]
    chart_version: Option<String>,

    /// Inline values (YAML or JSON)
    #[arg(long, env = "INPUT_VALUES")]
    values: Option<String>,

    /// Task to run: upgrade (default) or remove
    #[arg(long, env = "INPUT_TASK")]
    task: Option<String>,

    /// Application version, passed as `app.version`
    #[arg(long = "app-version", env = "INPUT_VERSION")]
    app_version: Option<String>,

    /// Additional value files (JSON list or a single path)
    #[arg(long, env = "INPUT_VALUE-FILES")]
    value_files: Option<String>,

    /// Remove the canary release before the upgrade
    #[arg(long, env = "INPUT_REMOVE-CANARY")]
    remove_canary: Option<String>,

    /// Package manager executable (`helm` or `helm3`)
    #[arg(long, env = "INPUT_HELM")]
    helm: Option<String>,

    /// Timeout passed to the upgrade
    #[arg(long, env = "INPUT_TIMEOUT")]
    timeout: Option<String>,

    /// Chart repository URL
    #[arg(long, env = "INPUT_REPOSITORY")]
    repository: Option<String>,

    /// Simulate the upgrade
    #[arg(long, env = "INPUT_DRY-RUN")]
    dry_run: Option<String>,

    /// Secrets exposed to value-file templates (JSON)
    #[arg(long, env = "INPUT_SECRETS", hide_env_values = true)]
    secrets: Option<String>,

    /// Roll back on a failed upgrade (default true)
    #[arg(long, env = "INPUT_ATOMIC")]
    atomic: Option<String>,

    /// Expiry of a preview release (helm3 only)
    #[arg(long, env = "INPUT_TTL")]
    ttl: Option<String>,

    /// Service account used by the expiry job
    #[arg(long, env = "INPUT_SERVICE-ACCOUNT")]
    service_account: Option<String>,

    /// Token for the deployment status API
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Triggering event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// Repository slug (owner/repo)
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository_slug: Option<String>,

    /// Commit being deployed
    #[arg(long, env = "GITHUB_SHA")]
    sha: Option<String>,

    /// Root of the REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Root of the web UI, used for log links
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    /// Inline kubeconfig contents
    #[arg(long, env = "KUBECONFIG_FILE", hide_env_values = true)]
    kubeconfig: Option<String>,

    /// gcloud executable
    #[arg(long, env = "GCLOUD_BINARY", default_value = GCLOUD_BINARY)]
    gcloud_bin: String,

    /// Directory for generated files; the package manager runs here
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Enable debug output
    #[arg(
        long,
        env = "RUNNER_DEBUG",
        value_parser = parse_debug,
        num_args = 0..=1,
        default_missing_value = "1"
    )]
    debug: Option<bool>,
}

impl Cli {
    fn declared_inputs(&self) -> DeclaredInputs {
        let mut inputs = DeclaredInputs::new();
        let pairs = [
            (names::CLUSTER_PROJECT, &self.clusterproject),
            (names::CLUSTER_LOCATION, &self.clusterlocation),
            (names::CLUSTER_NAME, &self.clustername),
            (names::CLUSTER_SA_JSON, &self.clustersajson),
            (names::TRACK, &self.track),
            (names::RELEASE, &self.release),
            (names::NAMESPACE, &self.namespace),
            (names::CHART, &self.chart),
            (names::CHART_VERSION, &self.chart_version),
            (names::VALUES, &self.values),
            (names::TASK, &self.task),
            (names::VERSION, &self.app_version),
            (names::VALUE_FILES, &self.value_files),
            (names::REMOVE_CANARY, &self.remove_canary),
            (names::HELM, &self.helm),
            (names::TIMEOUT, &self.timeout),
            (names::REPOSITORY, &self.repository),
            (names::DRY_RUN, &self.dry_run),
            (names::SECRETS, &self.secrets),
            (names::ATOMIC, &self.atomic),
            (names::TTL, &self.ttl),
            (names::SERVICE_ACCOUNT, &self.service_account),
        ];
        for (name, value) in pairs {
            inputs.set(name, value.clone());
        }
        inputs
    }

    fn event(&self) -> Result<DeploymentEvent> {
        match &self.event_path {
            Some(path) => DeploymentEvent::from_file(path).map_err(CliError::from),
            None => Ok(DeploymentEvent::without_deployment()),
        }
    }

    fn reporter(&self, event: &DeploymentEvent) -> DeploymentReporter {
        let context = match (&self.repository_slug, &self.sha) {
            (Some(slug), Some(sha)) => RepoContext::from_slug(slug, sha.as_str()).map(|ctx| {
                ctx.with_api_url(self.api_url.as_str())
                    .with_server_url(self.server_url.as_str())
            }),
            _ => None,
        };

        DeploymentReporter::new(self.token.clone(), context, event.deployment_id()).unwrap_or_else(
            |e| {
                warn!("Failed to set up deployment status reporting: {}", e);
                DeploymentReporter::disabled()
            },
        )
    }

    fn settings(&self) -> Settings {
        Settings {
            workdir: self.workdir.clone(),
            gcloud: self.gcloud_bin.clone(),
            kubeconfig: self.kubeconfig.clone(),
            key_dir: None,
        }
    }
}

/// `RUNNER_DEBUG` is `1` when step debugging is on
fn parse_debug(value: &str) -> std::result::Result<bool, String> {
    Ok(matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    ))
}

fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<RunSummary> {
    // Reporting needs the event, so an unreadable event cannot be reported
    let event = cli.event()?;
    let reporter = cli.reporter(&event);
    debug!(enabled = reporter.is_enabled(), "deployment status reporting");

    let runner = ProcessRunner::in_dir(cli.workdir.clone());
    Orchestrator::new(&runner, &reporter, cli.settings())
        .run(&cli.declared_inputs(), &event)
        .await
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug.unwrap_or(false));

    match run(&cli).await {
        Ok(summary) => {
            let verb = match summary.state {
                DeploymentState::Inactive => "removed",
                _ => "deployed",
            };
            println!(
                "{} Release {} {} in namespace {}",
                style("✓").green().bold(),
                style(&summary.release).cyan(),
                verb,
                style(&summary.namespace).yellow()
            );
            let ignored = summary.report.ignored_failures().count();
            if ignored > 0 {
                println!(
                    "  {} {} best-effort step(s) failed",
                    style("⚠").yellow(),
                    ignored
                );
            }
        }
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
    }
}
