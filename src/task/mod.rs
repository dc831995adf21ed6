//! The task engine.
//!
//! [`TaskNode`] is the object-safe seam a task declaration implements;
//! [`Registry`] owns construction, [`Resolver`] walks dependency edges
//! depth-first, and [`TaskRun`] is the task instance carrying the resolved
//! inputs and produced outputs of one run.

/// Construction registry for task declarations
mod registry;
pub use registry::{BuildFn, Registry};

/// Depth-first dependency resolution
mod resolver;
pub use resolver::{DepPolicy, Resolver};

/// A single task instance and its run records
mod run;
pub use run::TaskRun;

use std::any::Any;

use anyhow::Result;

use crate::env::{self, EnvKind, EnvSession};
use crate::schema::{TaskSpec, Value};
use crate::util::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no task registered under name '{0}'")]
    UnknownTask(String),
    #[error("task '{0}' is already registered")]
    DuplicateTask(String),
    #[error("task '{task}' has no output method '{method}'")]
    UnknownMethod {
        task: &'static str,
        method: String,
    },
    #[error("dependency cycle: {0}")]
    DependencyCycle(String),
    #[error("no dependency bound to parameter '{0}'")]
    MissingDependency(String),
    #[error("dependency '{param}' is not a {expected}")]
    DependencyType {
        param: String,
        expected: &'static str,
    },
}

/// A task declaration: static metadata plus the output method bodies.
///
/// `invoke` dispatches on the method name declared in the spec; the engine
/// only calls it with names from `spec().outputs`, each time with that
/// method's dependencies already resolved and recorded. Implementations
/// should answer unknown names with [`Error::UnknownMethod`].
pub trait TaskNode: Any {
    fn spec(&self) -> &'static TaskSpec;

    fn invoke(&mut self, method: &str, deps: &Deps) -> Result<Value>;

    /// For downcasting a resolved dependency to its concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Open a scoped execution environment for use inside an output method.
    fn env(&self, kind: EnvKind) -> Result<EnvSession, env::Error> {
        EnvSession::open(kind)
    }
}

/// View over the dependency instances resolved for one task, keyed by the
/// parameter names declared in its output specs.
pub struct Deps<'a> {
    runs: &'a HashMap<String, TaskRun>,
}

impl<'a> Deps<'a> {
    pub(crate) fn new(runs: &'a HashMap<String, TaskRun>) -> Self {
        Self { runs }
    }

    /// The completed run bound to `param`.
    pub fn run(&self, param: &str) -> Result<&'a TaskRun, Error> {
        self.runs
            .get(param)
            .ok_or_else(|| Error::MissingDependency(param.to_owned()))
    }

    /// The dependency instance bound to `param`, downcast to its concrete
    /// type so its own fields can be inspected.
    pub fn task<T: TaskNode>(&self, param: &str) -> Result<&'a T, Error> {
        let run = self.run(param)?;
        run.task::<T>().ok_or_else(|| Error::DependencyType {
            param: param.to_owned(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// One of the dependency's recorded output values.
    pub fn output(&self, param: &str, method: &str) -> Result<&'a Value, Error> {
        let run = self.run(param)?;
        run.output(method).ok_or_else(|| Error::UnknownMethod {
            task: run.name(),
            method: method.to_owned(),
        })
    }
}
