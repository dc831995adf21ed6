use anyhow::{Context, Result};
use colored::Colorize;

use crate::schema::{TaskSpec, Value};
use crate::util::HashMap;

use super::{Deps, Registry, Resolver, TaskNode};

/// One runtime instantiation of a task declaration.
///
/// Owns the node plus the records accumulated while running: resolved
/// dependency instances keyed by parameter name, and produced values keyed
/// by output method name. Both are populated incrementally, and both stay
/// readable after a failed run so partial results can be inspected. An
/// instance is disposable after its run; nothing persists across runs.
pub struct TaskRun {
    node: Box<dyn TaskNode>,
    inputs: HashMap<String, TaskRun>,
    outputs: HashMap<String, Value>,
}

impl TaskRun {
    pub fn new(node: Box<dyn TaskNode>) -> Self {
        Self {
            node,
            inputs: HashMap::default(),
            outputs: HashMap::default(),
        }
    }

    pub fn spec(&self) -> &'static TaskSpec {
        self.node.spec()
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Run every declared output method, in declaration order. Each method's
    /// dependencies are resolved and run to completion first, then the method
    /// executes with those instances bound. The first failing method aborts
    /// the run with its error; values recorded before it remain accessible.
    pub fn run(&mut self, resolver: &mut Resolver) -> Result<()> {
        resolver.enter(self.name())?;
        let result = self.run_outputs(resolver);
        resolver.exit();
        result
    }

    /// Run with a fresh default-policy resolver over `registry`.
    pub fn run_with(&mut self, registry: &Registry) -> Result<()> {
        self.run(&mut Resolver::new(registry))
    }

    fn run_outputs(&mut self, resolver: &mut Resolver) -> Result<()> {
        let spec = self.node.spec();
        for output in spec.outputs {
            log::info!("{} {}.{}", "RUN".green(), spec.name.cyan(), output.name);

            resolver.resolve(output, &mut self.inputs).with_context(|| {
                format!(
                    "while resolving dependencies of {}.{}",
                    spec.name, output.name
                )
            })?;

            let value = self
                .node
                .invoke(output.name, &Deps::new(&self.inputs))
                .with_context(|| {
                    format!("while running output method {}.{}", spec.name, output.name)
                })?;

            log::info!(
                "{} {}.{} = {value}",
                "COMPLETED".green(),
                spec.name.cyan(),
                output.name
            );
            self.outputs.insert(output.name.to_owned(), value);
        }
        Ok(())
    }

    /// The value produced by `method`, if it has run.
    pub fn output(&self, method: &str) -> Option<&Value> {
        self.outputs.get(method)
    }

    /// Recorded outputs, in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.spec()
            .outputs
            .iter()
            .filter_map(|o| self.outputs.get(o.name).map(|v| (o.name, v)))
    }

    /// The dependency instance resolved for `param`, if any method needed it.
    pub fn input(&self, param: &str) -> Option<&TaskRun> {
        self.inputs.get(param)
    }

    pub fn inputs(&self) -> impl Iterator<Item = (&str, &TaskRun)> {
        self.inputs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Typed view of the underlying task, for inspecting its fields.
    pub fn task<T: TaskNode>(&self) -> Option<&T> {
        self.node.as_any().downcast_ref()
    }

    /// True once every declared output method has a recorded value.
    pub fn is_complete(&self) -> bool {
        self.spec()
            .outputs
            .iter()
            .all(|o| self.outputs.contains_key(o.name))
    }
}
