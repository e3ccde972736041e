//! Runner that spawns real processes

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::CommandRunner;
use crate::error::{KubeError, Result};
use crate::plan::Invocation;

/// Spawns invocations as child processes, streaming their output to ours
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    working_dir: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every process from this directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    #[instrument(skip_all, fields(step = %invocation.step, program = %invocation.program))]
    async fn run(&self, invocation: &Invocation) -> Result<i32> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        invocation.env.apply(&mut command);

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!(command = %invocation, "spawning");

        let status = command.status().await.map_err(|source| KubeError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        // Killed by a signal: no exit code
        Ok(status.code().unwrap_or(-1))
    }
}
