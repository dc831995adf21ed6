use anyhow::Result;

use crate::schema::{Config, TaskSpec};
use crate::util::HashMap;

use super::{Error, TaskNode, TaskRun};

/// Constructor registered for a task declaration. Receives the fully-bound
/// configuration (defaults plus overrides, validated against the spec).
pub type BuildFn = fn(&Config) -> Result<Box<dyn TaskNode>>;

struct Registration {
    spec: &'static TaskSpec,
    build: BuildFn,
}

/// Explicit construction registry.
///
/// Dependency edges refer to tasks by registered name; this is where those
/// names resolve to specs and constructors. Keeping construction here (rather
/// than in implicit class-level state) makes fresh-vs-shared instantiation a
/// resolver policy instead of an accident.
#[derive(Default)]
pub struct Registry {
    tasks: HashMap<&'static str, Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task declaration. Names are unique.
    pub fn add(&mut self, spec: &'static TaskSpec, build: BuildFn) -> Result<&mut Self, Error> {
        if self.tasks.contains_key(spec.name) {
            return Err(Error::DuplicateTask(spec.name.to_owned()));
        }
        log::trace!("registered task '{}'", spec.name);
        self.tasks.insert(spec.name, Registration { spec, build });
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn spec(&self, name: &str) -> Option<&'static TaskSpec> {
        self.tasks.get(name).map(|r| r.spec)
    }

    /// Construct a fresh instance of `name`: bind its field defaults and
    /// `overrides`, build the node, and wrap it in an unrun [`TaskRun`].
    pub fn instance(&self, name: &str, overrides: &Config) -> Result<TaskRun> {
        let reg = self
            .tasks
            .get(name)
            .ok_or_else(|| Error::UnknownTask(name.to_owned()))?;
        let cfg = Config::bind(reg.spec, overrides)?;
        let node = (reg.build)(&cfg)?;
        Ok(TaskRun::new(node))
    }
}
