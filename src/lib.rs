//! Typed task declarations with a dependency-aware runner.
//!
//! A task is declared as a plain struct plus a static [`TaskSpec`] describing
//! its typed configuration fields and output-producing methods. The engine
//! resolves the task dependencies declared on each output method, runs them
//! depth-first, and records every resolved dependency and produced value on
//! the owning [`TaskRun`]. Output methods can shell out through a scoped
//! [`EnvSession`] bound to one external interpreter.
//!
//! The same field metadata also drives a command-line parser: see
//! [`schema::cli`] for the pure spec-to-clap transform.

/// Scoped execution environments for shelling out to interpreters
pub mod env;
/// Static task schemas, runtime values, and the CLI transform
pub mod schema;
/// The task engine: node trait, registry, resolver, run records
pub mod task;
/// FxHasher-backed collections
pub mod util;

pub use env::{EnvKind, EnvSession};
pub use schema::{Config, DepSpec, FieldKind, FieldSpec, GroupSpec, OutputSpec, TaskSpec, Value};
pub use task::{DepPolicy, Deps, Registry, Resolver, TaskNode, TaskRun};
