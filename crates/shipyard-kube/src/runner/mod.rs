//! Command runners
//!
//! The [`CommandRunner`] trait is the seam between planning and the outside
//! world: [`ProcessRunner`] spawns real processes, [`MockRunner`] records
//! invocations for tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::plan::Invocation;

mod mock;
mod process;

pub use mock::MockRunner;
pub use process::ProcessRunner;

/// Runs one invocation to completion
///
/// Success is decided by exit code only; output is not parsed. An `Err` means
/// the process could not be run at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the invocation and return its exit code
    async fn run(&self, invocation: &Invocation) -> Result<i32>;
}
