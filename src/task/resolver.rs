use anyhow::{Context, Result};
use colored::Colorize;

use crate::schema::{Config, OutputSpec};
use crate::util::HashMap;

use super::{Error, Registry, TaskRun};

/// Whether dependency instances are shared between output methods of the
/// same task. Sharing across unrelated tasks is out of scope either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DepPolicy {
    /// Construct a fresh dependency instance for every output method.
    #[default]
    Fresh,
    /// Reuse an instance resolved by an earlier method when both the
    /// parameter name and the task name match.
    Reuse,
}

/// Resolves the dependency edges of one output method at a time:
/// look the task name up in the registry, construct it from its own
/// defaults, run it to completion, and record it under the parameter name.
/// All of that happens before the owning method body executes.
pub struct Resolver<'r> {
    registry: &'r Registry,
    policy: DepPolicy,
    /// names of tasks currently being resolved, outermost first
    stack: Vec<&'static str>,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_policy(registry, DepPolicy::default())
    }

    pub fn with_policy(registry: &'r Registry, policy: DepPolicy) -> Self {
        Self {
            registry,
            policy,
            stack: Vec::with_capacity(8),
        }
    }

    /// Mark `name` as in-flight, failing if the current resolution chain
    /// already contains it.
    pub(crate) fn enter(&mut self, name: &'static str) -> Result<(), Error> {
        if self.stack.contains(&name) {
            let mut chain = self.stack.join(" -> ");
            chain.push_str(" -> ");
            chain.push_str(name);
            return Err(Error::DependencyCycle(chain));
        }
        self.stack.push(name);
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        self.stack.pop();
    }

    /// Resolve one output method's dependencies into `inputs`.
    pub(crate) fn resolve(
        &mut self,
        output: &OutputSpec,
        inputs: &mut HashMap<String, TaskRun>,
    ) -> Result<()> {
        for dep in output.deps {
            if self.policy == DepPolicy::Reuse {
                if let Some(existing) = inputs.get(dep.param) {
                    if existing.name() == dep.task && existing.is_complete() {
                        log::debug!(
                            "reusing dependency {} for parameter '{}'",
                            dep.task.cyan(),
                            dep.param
                        );
                        continue;
                    }
                }
            }

            log::debug!(
                "resolving dependency {} for parameter '{}'",
                dep.task.cyan(),
                dep.param
            );
            let mut run = self
                .registry
                .instance(dep.task, &Config::default())
                .with_context(|| format!("while constructing dependency task '{}'", dep.task))?;
            run.run(self)?;
            inputs.insert(dep.param.to_owned(), run);
        }
        Ok(())
    }
}
