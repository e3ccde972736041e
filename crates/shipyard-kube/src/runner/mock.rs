//! Mock runner for testing
//!
//! Records every invocation instead of spawning it, and returns scripted
//! exit codes. Useful for exercising plans without gcloud or helm installed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::CommandRunner;
use crate::error::{KubeError, Result};
use crate::plan::{Invocation, Step};

/// In-memory runner for testing
#[derive(Clone, Default)]
pub struct MockRunner {
    /// Invocations in the order they were run
    recorded: Arc<Mutex<Vec<Invocation>>>,
    /// Exit codes by step (default 0)
    exit_codes: Arc<Mutex<HashMap<Step, i32>>>,
    /// Steps whose program cannot be started
    unspawnable: Arc<Mutex<Vec<Step>>>,
}

impl MockRunner {
    /// Create a runner where everything succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a step exit with the given code
    pub fn with_exit_code(self, step: Step, code: i32) -> Self {
        self.exit_codes.lock().unwrap().insert(step, code);
        self
    }

    /// Make a step fail to spawn
    pub fn with_spawn_failure(self, step: Step) -> Self {
        self.unspawnable.lock().unwrap().push(step);
        self
    }

    /// Invocations run so far
    pub fn invocations(&self) -> Vec<Invocation> {
        self.recorded.lock().unwrap().clone()
    }

    /// Steps run so far, in order
    pub fn steps(&self) -> Vec<Step> {
        self.recorded.lock().unwrap().iter().map(|i| i.step).collect()
    }

    /// Number of invocations run so far
    pub fn call_count(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, invocation: &Invocation) -> Result<i32> {
        self.recorded.lock().unwrap().push(invocation.clone());

        if self.unspawnable.lock().unwrap().contains(&invocation.step) {
            return Err(KubeError::Spawn {
                program: invocation.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock: not found"),
            });
        }

        Ok(self
            .exit_codes
            .lock()
            .unwrap()
            .get(&invocation.step)
            .copied()
            .unwrap_or(0))
    }
}
