//! Plan execution
//!
//! Runs a [`CommandPlan`] strictly in order. Ignored steps that fail are
//! logged and skipped over; the first failing fatal step aborts the run.
//! Nothing is retried.

use tracing::{info, warn};

use crate::error::{KubeError, Result};
use crate::plan::{CommandPlan, FailurePolicy, Step};
use crate::runner::CommandRunner;

/// Result of one executed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: Step,
    pub code: i32,
    pub policy: FailurePolicy,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.code == 0
    }
}

/// Outcomes of a completed plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub outcomes: Vec<StepOutcome>,
}

impl ExecutionReport {
    /// Steps that failed but were ignored
    pub fn ignored_failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}

/// Executes command plans through a runner
pub struct Sequencer<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Sequencer<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Execute every invocation in order
    ///
    /// A program that cannot be started is always fatal; the failure policy
    /// only covers non-zero exits.
    pub async fn execute(&self, plan: &CommandPlan) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::default();

        for invocation in plan {
            info!(step = %invocation.step, "running: {}", invocation);
            let code = self.runner.run(invocation).await?;

            if code != 0 {
                match invocation.policy {
                    FailurePolicy::Ignored => {
                        warn!(
                            step = %invocation.step,
                            code,
                            "{} exited with status {}, continuing",
                            invocation.program,
                            code
                        );
                    }
                    FailurePolicy::Fatal => {
                        return Err(KubeError::StepFailed {
                            step: invocation.step,
                            program: invocation.program.clone(),
                            code,
                        });
                    }
                }
            }

            report.outcomes.push(StepOutcome {
                step: invocation.step,
                code,
                policy: invocation.policy,
            });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Invocation;
    use crate::runner::MockRunner;

    fn plan() -> CommandPlan {
        vec![
            Invocation::new(Step::RemoveCanary, "helm", FailurePolicy::Ignored),
            Invocation::new(Step::Upgrade, "helm", FailurePolicy::Fatal),
            Invocation::new(Step::SetTtl, "helm", FailurePolicy::Fatal),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_runs_in_order() {
        let runner = MockRunner::new();
        let report = Sequencer::new(&runner).execute(&plan()).await.unwrap();

        assert_eq!(
            runner.steps(),
            vec![Step::RemoveCanary, Step::Upgrade, Step::SetTtl]
        );
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.ignored_failures().count(), 0);
    }

    #[tokio::test]
    async fn test_ignored_failure_continues() {
        let runner = MockRunner::new().with_exit_code(Step::RemoveCanary, 1);
        let report = Sequencer::new(&runner).execute(&plan()).await.unwrap();

        assert_eq!(runner.call_count(), 3);
        let ignored: Vec<_> = report.ignored_failures().map(|o| o.step).collect();
        assert_eq!(ignored, vec![Step::RemoveCanary]);
    }

    #[tokio::test]
    async fn test_fatal_failure_aborts_remaining_plan() {
        let runner = MockRunner::new().with_exit_code(Step::Upgrade, 2);
        let err = Sequencer::new(&runner).execute(&plan()).await.unwrap_err();

        assert!(matches!(
            err,
            KubeError::StepFailed {
                step: Step::Upgrade,
                code: 2,
                ..
            }
        ));
        assert_eq!(runner.steps(), vec![Step::RemoveCanary, Step::Upgrade]);
    }

    #[tokio::test]
    async fn test_failed_ttl_assignment_surfaces() {
        let runner = MockRunner::new().with_exit_code(Step::SetTtl, 1);
        let err = Sequencer::new(&runner).execute(&plan()).await.unwrap_err();
        assert!(matches!(err, KubeError::StepFailed { step: Step::SetTtl, .. }));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_fatal_even_when_ignored() {
        let runner = MockRunner::new().with_spawn_failure(Step::RemoveCanary);
        let err = Sequencer::new(&runner).execute(&plan()).await.unwrap_err();
        assert!(matches!(err, KubeError::Spawn { .. }));
        assert_eq!(runner.call_count(), 1);
    }
}
