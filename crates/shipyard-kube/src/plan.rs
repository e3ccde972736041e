//! Command plans
//!
//! A plan is the ordered list of external invocations for one run. Each entry
//! declares whether a non-zero exit aborts the run or is only logged.

use std::fmt;

use crate::env::EnvOverlay;

/// What to do when an invocation exits unsuccessfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the remaining plan
    Fatal,
    /// Log and continue (best-effort cleanup)
    Ignored,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Fatal => write!(f, "fatal"),
            FailurePolicy::Ignored => write!(f, "ignored"),
        }
    }
}

/// Role of an invocation within the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ActivateServiceAccount,
    FetchClusterCredentials,
    RemoveCanary,
    UnsetTtl,
    Delete,
    Upgrade,
    SetTtl,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::ActivateServiceAccount => "service account activation",
            Step::FetchClusterCredentials => "cluster credentials fetch",
            Step::RemoveCanary => "canary removal",
            Step::UnsetTtl => "ttl unset",
            Step::Delete => "release deletion",
            Step::Upgrade => "release upgrade",
            Step::SetTtl => "ttl assignment",
        };
        write!(f, "{}", s)
    }
}

/// One external invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub step: Step,
    pub program: String,
    pub args: Vec<String>,
    pub env: EnvOverlay,
    pub policy: FailurePolicy,
}

impl Invocation {
    pub fn new(step: Step, program: impl Into<String>, policy: FailurePolicy) -> Self {
        Self {
            step,
            program: program.into(),
            args: Vec::new(),
            env: EnvOverlay::new(),
            policy,
        }
    }

    /// Append arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Replace the environment overlay
    pub fn env(mut self, env: EnvOverlay) -> Self {
        self.env = env;
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.policy == FailurePolicy::Fatal
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Ordered invocations for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPlan {
    invocations: Vec<Invocation>,
}

impl CommandPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, invocation: Invocation) {
        self.invocations.push(invocation);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Invocation> {
        self.invocations.iter()
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    /// Steps in execution order
    pub fn steps(&self) -> Vec<Step> {
        self.invocations.iter().map(|i| i.step).collect()
    }

    /// First invocation for a step
    pub fn find(&self, step: Step) -> Option<&Invocation> {
        self.invocations.iter().find(|i| i.step == step)
    }
}

impl<'a> IntoIterator for &'a CommandPlan {
    type Item = &'a Invocation;
    type IntoIter = std::slice::Iter<'a, Invocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Invocation> for CommandPlan {
    fn from_iter<T: IntoIterator<Item = Invocation>>(iter: T) -> Self {
        Self {
            invocations: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for CommandPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, invocation) in self.invocations.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "[{}] {}", invocation.policy, invocation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display_quotes_whitespace() {
        let inv = Invocation::new(Step::Upgrade, "helm", FailurePolicy::Fatal)
            .args(["upgrade", "svc", "--set=msg=hello world"]);
        assert_eq!(inv.to_string(), "helm upgrade svc '--set=msg=hello world'");
    }

    #[test]
    fn test_plan_display() {
        let plan: CommandPlan = vec![
            Invocation::new(Step::RemoveCanary, "helm", FailurePolicy::Ignored)
                .args(["delete", "--purge", "svc-canary"]),
            Invocation::new(Step::Upgrade, "helm", FailurePolicy::Fatal).args(["upgrade", "svc"]),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            plan.to_string(),
            "[ignored] helm delete --purge svc-canary\n[fatal] helm upgrade svc"
        );
        assert_eq!(plan.steps(), vec![Step::RemoveCanary, Step::Upgrade]);
        assert!(plan.find(Step::SetTtl).is_none());
    }
}
