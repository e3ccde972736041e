//! Integration tests for the shipyard binary
//!
//! `gcloud` and `helm` are replaced by shell scripts that append their
//! arguments to a log file and exit with a configurable status.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SA_JSON: &str = r#"{"client_email": "deployer@proj.iam.gserviceaccount.com"}"#;

/// A sandbox with fake tools, a working directory and a private temp dir
struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let sandbox = Self {
            root: TempDir::new().expect("Failed to create sandbox"),
        };
        for dir in ["bin", "work", "tmp"] {
            fs::create_dir(sandbox.path(dir)).unwrap();
        }
        sandbox.fake_tool("gcloud", "FAKE_GCLOUD_EXIT");
        sandbox.fake_tool("helm", "FAKE_HELM_EXIT");
        sandbox.fake_tool("helm3", "FAKE_HELM_EXIT");
        sandbox
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn workdir(&self) -> PathBuf {
        self.path("work")
    }

    fn fake_tool(&self, name: &str, exit_var: &str) {
        let script = format!(
            "#!/bin/sh\necho \"{name} $*\" >> \"{log}\"\nexit ${{{exit_var}:-0}}\n",
            name = name,
            log = self.path("calls.log").display(),
            exit_var = exit_var,
        );
        let path = self.path("bin").join(name);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Lines written by the fake tools, in call order
    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.path("calls.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn command(&self) -> Command {
        let path = format!(
            "{}:{}",
            self.path("bin").display(),
            std::env::var("PATH").unwrap_or_default()
        );

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_shipyard"));
        cmd.env_clear()
            .env("PATH", path)
            .env("TMPDIR", self.path("tmp"))
            .env("GCLOUD_BINARY", self.path("bin").join("gcloud"))
            .env("INPUT_CLUSTERPROJECT", "proj")
            .env("INPUT_CLUSTERLOCATION", "europe-west1-b")
            .env("INPUT_CLUSTERNAME", "main")
            .env("INPUT_CLUSTERSAJSON", SA_JSON)
            .env("INPUT_RELEASE", "shop")
            .env("INPUT_NAMESPACE", "prod")
            .env("INPUT_CHART", "app")
            .arg("--workdir")
            .arg(self.workdir());
        cmd
    }

    fn run(&self, configure: impl FnOnce(&mut Command)) -> Output {
        let mut cmd = self.command();
        configure(&mut cmd);
        cmd.output().expect("Failed to execute shipyard")
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_stable_upgrade() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(|_| {});

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let calls = sandbox.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].starts_with("gcloud auth activate-service-account --key-file="));
    assert_eq!(
        calls[1],
        "gcloud container clusters get-credentials main --zone europe-west1-b \
         --project proj --account deployer@proj.iam.gserviceaccount.com"
    );
    assert_eq!(
        calls[2],
        "helm upgrade shop /usr/src/charts/app --install --namespace=prod \
         --set=app.name=shop --values=./values.yml --atomic"
    );

    assert_eq!(read(&sandbox.workdir().join("values.yml")), "{}");
    assert_eq!(fs::read_dir(sandbox.path("tmp")).unwrap().count(), 0);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("shop"));
}

#[test]
fn test_canary_with_value_files() {
    let sandbox = Sandbox::new();
    fs::write(
        sandbox.workdir().join("extra.yml"),
        "token: ${{ secrets.API_TOKEN }}\n",
    )
    .unwrap();

    let output = sandbox.run(|cmd| {
        cmd.env("INPUT_TRACK", "canary")
            .env("INPUT_VALUE-FILES", r#"["extra.yml", ""]"#)
            .env("INPUT_SECRETS", r#"{"API_TOKEN": "abc"}"#)
            .env("INPUT_VERSION", "1.2.3");
    });

    assert!(output.status.success());
    assert_eq!(read(&sandbox.workdir().join("extra.yml")), "token: abc\n");

    let upgrade = sandbox.calls().pop().unwrap();
    assert_eq!(
        upgrade,
        "helm upgrade shop-canary /usr/src/charts/app --install --namespace=prod \
         --set=app.name=shop --set=app.version=1.2.3 --values=extra.yml \
         --values=./values.yml --set=service.enabled=false --set=ingress.enabled=false --atomic"
    );
}

#[test]
fn test_ttl_without_preview_release_aborts() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(|cmd| {
        cmd.env("INPUT_HELM", "helm3").env("INPUT_TTL", "3d");
    });

    assert_eq!(output.status.code(), Some(2));
    assert!(sandbox.calls().is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("-pr-"));
}

#[test]
fn test_ttl_on_preview_release() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(|cmd| {
        cmd.env("INPUT_RELEASE", "shop-pr-7")
            .env("INPUT_HELM", "helm3")
            .env("INPUT_TTL", "3d");
    });

    assert!(output.status.success());
    assert_eq!(
        sandbox.calls().pop().unwrap(),
        "helm3 --namespace=prod release ttl shop-pr-7 --service-account=helm-ttl-plugin --set=3d"
    );
}

#[test]
fn test_remove_ignores_delete_failure() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(|cmd| {
        cmd.env("INPUT_TASK", "remove")
            .env("INPUT_HELM", "helm3")
            .env("FAKE_HELM_EXIT", "1");
    });

    assert!(output.status.success());
    let calls = sandbox.calls();
    assert_eq!(
        calls[2..],
        [
            "helm3 --namespace=prod release ttl shop --unset",
            "helm3 delete -n prod shop",
        ]
    );
}

#[test]
fn test_upgrade_failure_exit_code() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(|cmd| {
        cmd.env("FAKE_HELM_EXIT", "1");
    });

    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_auth_failure_exit_code() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(|cmd| {
        cmd.env("FAKE_GCLOUD_EXIT", "1");
    });

    assert_eq!(output.status.code(), Some(4));
    assert_eq!(sandbox.calls().len(), 1);
    assert_eq!(fs::read_dir(sandbox.path("tmp")).unwrap().count(), 0);
}

#[test]
fn test_missing_input_exit_code() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(|cmd| {
        cmd.env_remove("INPUT_NAMESPACE");
    });

    assert_eq!(output.status.code(), Some(2));
    assert!(sandbox.calls().is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("namespace"));
}

#[test]
fn test_deployment_payload_overrides() {
    let sandbox = Sandbox::new();
    let event = sandbox.path("event.json");
    fs::write(
        &event,
        serde_json::json!({
            "deployment": {
                "id": 11,
                "payload": {"values": {"replicas": 3}, "dry-run": true}
            }
        })
        .to_string(),
    )
    .unwrap();

    let output = sandbox.run(|cmd| {
        cmd.env("GITHUB_EVENT_PATH", &event);
    });

    assert!(output.status.success());
    assert_eq!(
        read(&sandbox.workdir().join("values.yml")),
        "replicas: 3\n"
    );
    // dry-run is never taken from the payload
    assert!(!sandbox.calls().pop().unwrap().contains("--dry-run"));
}
