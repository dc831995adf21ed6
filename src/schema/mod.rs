//! Static task metadata and the runtime values bound to it.
//!
//! Everything the engine knows about a task is declared up front in a
//! [`TaskSpec`]: its typed configuration fields (optionally grouped), and its
//! output methods together with the task dependencies each one declares.
//! There is no runtime type inspection; the resolver and the CLI transform
//! both consult this metadata directly.

/// Pure schema-to-clap transform
pub mod cli;

use crate::util::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("field '{0}' is required but no value was supplied")]
    MissingField(String),
    #[error("field '{field}' does not hold a {expected} value")]
    WrongType { field: String, expected: &'static str },
    #[error("invalid default '{default}' for {kind} field '{field}'")]
    BadDefault {
        field: &'static str,
        kind: &'static str,
        default: &'static str,
    },
    #[error("no field named '{0}' is declared")]
    UnknownField(String),
}

/// Declared type of one configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

/// One typed configuration field. Fields without a default are required,
/// and become positional arguments in the CLI transform.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// textual default, parsed per `kind` at bind time
    pub default: Option<&'static str>,
    pub help: &'static str,
}

impl FieldSpec {
    pub const fn required(&self) -> bool {
        self.default.is_none()
    }

    /// Parse `text` according to this field's declared kind.
    pub fn parse(&self, text: &str) -> Result<Value, Error> {
        let wrong_type = || Error::WrongType {
            field: self.name.to_owned(),
            expected: self.kind.name(),
        };
        match self.kind {
            FieldKind::Str => Ok(Value::Str(text.to_owned())),
            FieldKind::Int => text.parse().map(Value::Int).map_err(|_| wrong_type()),
            FieldKind::Float => text.parse().map(Value::Float).map_err(|_| wrong_type()),
            FieldKind::Bool => text.parse().map(Value::Bool).map_err(|_| wrong_type()),
        }
    }
}

/// A named group of fields, rendered under its own help heading.
#[derive(Debug, Clone, Copy)]
pub struct GroupSpec {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// A dependency edge: an output method parameter, and the registered name
/// of the task declaration that supplies it.
#[derive(Debug, Clone, Copy)]
pub struct DepSpec {
    pub param: &'static str,
    pub task: &'static str,
}

/// One output-producing method and the dependencies it declares.
#[derive(Debug, Clone, Copy)]
pub struct OutputSpec {
    pub name: &'static str,
    pub deps: &'static [DepSpec],
}

/// The full declaration of a task: fields, groups, and output methods.
#[derive(Debug)]
pub struct TaskSpec {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
    pub groups: &'static [GroupSpec],
    pub outputs: &'static [OutputSpec],
}

impl TaskSpec {
    /// Own fields first, then grouped fields, in declaration order.
    pub fn all_fields(&self) -> impl Iterator<Item = &'static FieldSpec> + '_ {
        self.fields
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.fields.iter()))
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.all_fields().find(|f| f.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&'static OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

/// A runtime value: a bound configuration field, or an output method result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Unit,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn matches(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (Self::Str(_), FieldKind::Str)
                | (Self::Int(_), FieldKind::Int)
                | (Self::Float(_), FieldKind::Float)
                | (Self::Bool(_), FieldKind::Bool)
        )
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Unit => write!(f, "()"),
        }
    }
}

/// A set of bound field values. Used both for construction overrides and for
/// the fully-bound configuration handed to a task's build fn.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Builder-style `set`, for assembling override sets inline.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Bind every field of `spec`: overrides win, defaults fill the rest.
    /// A required field with no override fails, as does an override whose
    /// name or type does not match the spec.
    pub fn bind(spec: &TaskSpec, overrides: &Config) -> Result<Self, Error> {
        for (name, _) in overrides.iter() {
            if spec.field(name).is_none() {
                return Err(Error::UnknownField(name.to_owned()));
            }
        }

        let mut values = HashMap::default();
        for field in spec.all_fields() {
            let value = match overrides.get(field.name) {
                Some(v) if v.matches(field.kind) => v.clone(),
                Some(_) => {
                    return Err(Error::WrongType {
                        field: field.name.to_owned(),
                        expected: field.kind.name(),
                    })
                }
                None => match field.default {
                    Some(text) => field.parse(text).map_err(|_| Error::BadDefault {
                        field: field.name,
                        kind: field.kind.name(),
                        default: text,
                    })?,
                    None => return Err(Error::MissingField(field.name.to_owned())),
                },
            };
            values.insert(field.name.to_owned(), value);
        }
        Ok(Self { values })
    }

    pub fn str_field(&self, name: &str) -> Result<&str, Error> {
        self.field(name)?.as_str().ok_or_else(|| Error::WrongType {
            field: name.to_owned(),
            expected: FieldKind::Str.name(),
        })
    }

    pub fn int_field(&self, name: &str) -> Result<i64, Error> {
        self.field(name)?.as_int().ok_or_else(|| Error::WrongType {
            field: name.to_owned(),
            expected: FieldKind::Int.name(),
        })
    }

    pub fn float_field(&self, name: &str) -> Result<f64, Error> {
        self.field(name)?
            .as_float()
            .ok_or_else(|| Error::WrongType {
                field: name.to_owned(),
                expected: FieldKind::Float.name(),
            })
    }

    pub fn bool_field(&self, name: &str) -> Result<bool, Error> {
        self.field(name)?.as_bool().ok_or_else(|| Error::WrongType {
            field: name.to_owned(),
            expected: FieldKind::Bool.name(),
        })
    }

    fn field(&self, name: &str) -> Result<&Value, Error> {
        self.values
            .get(name)
            .ok_or_else(|| Error::UnknownField(name.to_owned()))
    }
}
