//! Pure transform from a [`TaskSpec`] to a clap command line.
//!
//! The mapping rules follow the field metadata directly: a field with no
//! default is a required positional argument; a defaulted field is a
//! `--name` option; a bool field is a flag whose presence flips the declared
//! default. Grouped fields render under a help heading named for the group.

use std::ffi::OsString;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

use super::{Config, FieldKind, FieldSpec, TaskSpec, Value};

/// Build the command line for `spec`.
pub fn to_command(spec: &TaskSpec) -> Command {
    let mut cmd = Command::new(spec.name);
    for field in spec.fields {
        cmd = cmd.arg(to_arg(spec.name, field, None));
    }
    for group in spec.groups {
        for field in group.fields {
            cmd = cmd.arg(to_arg(spec.name, field, Some(group.name)));
        }
    }
    cmd
}

/// Parse `argv` against `spec`'s command line and bind the matches into a
/// fully-populated [`Config`] (defaults filled in by clap).
pub fn parse_config<I, T>(spec: &TaskSpec, argv: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = to_command(spec)
        .try_get_matches_from(argv)
        .with_context(|| format!("while parsing arguments for task '{}'", spec.name))?;

    let mut cfg = Config::new();
    for field in spec.all_fields() {
        let value = match field.kind {
            FieldKind::Str => matches
                .get_one::<String>(field.name)
                .map(|s| Value::Str(s.clone())),
            FieldKind::Int => matches.get_one::<i64>(field.name).copied().map(Value::Int),
            FieldKind::Float => matches
                .get_one::<f64>(field.name)
                .copied()
                .map(Value::Float),
            FieldKind::Bool => Some(Value::Bool(matches.get_flag(field.name))),
        };
        if let Some(value) = value {
            cfg.set(field.name, value);
        }
    }
    Ok(cfg)
}

fn to_arg(task: &str, field: &'static FieldSpec, group: Option<&'static str>) -> Arg {
    let mut arg = Arg::new(field.name);

    arg = match field.kind {
        // flags flip their declared default; no default means plain off-by-default
        FieldKind::Bool => {
            let default_on = field.default == Some("true");
            let action = if default_on {
                ArgAction::SetFalse
            } else {
                ArgAction::SetTrue
            };
            arg.long(field.name).action(action)
        }
        kind => {
            arg = match kind {
                FieldKind::Int => arg.value_parser(clap::value_parser!(i64)),
                FieldKind::Float => arg.value_parser(clap::value_parser!(f64)),
                _ => arg,
            };
            match field.default {
                // defaultless fields are required and positional
                None => arg.required(true),
                Some(default) => arg
                    .long(field.name)
                    .default_value(default)
                    .env(format!(
                        "{}_{}",
                        task.to_uppercase(),
                        field.name.to_uppercase()
                    )),
            }
        }
    };

    if !field.help.is_empty() {
        arg = arg.help(field.help);
    }
    if let Some(heading) = group {
        arg = arg.help_heading(heading);
    }
    arg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::GroupSpec;
    use anyhow::Result;

    static SPEC: TaskSpec = TaskSpec {
        name: "wordcount",
        fields: &[
            FieldSpec {
                name: "infile",
                kind: FieldKind::Str,
                default: None,
                help: "file to count",
            },
            FieldSpec {
                name: "top",
                kind: FieldKind::Int,
                default: Some("10"),
                help: "",
            },
            FieldSpec {
                name: "unique",
                kind: FieldKind::Bool,
                default: Some("false"),
                help: "",
            },
            FieldSpec {
                name: "fold_case",
                kind: FieldKind::Bool,
                default: Some("true"),
                help: "",
            },
        ],
        groups: &[GroupSpec {
            name: "output",
            fields: &[FieldSpec {
                name: "sep",
                kind: FieldKind::Str,
                default: Some(","),
                help: "",
            }],
        }],
        outputs: &[],
    };

    #[test]
    fn required_field_is_positional() -> Result<()> {
        let cfg = parse_config(&SPEC, ["wordcount", "in.txt"])?;
        assert_eq!(cfg.str_field("infile")?, "in.txt");
        Ok(())
    }

    #[test]
    fn missing_positional_is_an_error() {
        assert!(parse_config(&SPEC, ["wordcount"]).is_err());
    }

    #[test]
    fn defaults_bind_when_argv_omits_options() -> Result<()> {
        let cfg = parse_config(&SPEC, ["wordcount", "in.txt"])?;
        assert_eq!(cfg.int_field("top")?, 10);
        assert_eq!(cfg.str_field("sep")?, ",");
        Ok(())
    }

    #[test]
    fn options_override_defaults() -> Result<()> {
        let cfg = parse_config(&SPEC, ["wordcount", "in.txt", "--top", "3", "--sep", ";"])?;
        assert_eq!(cfg.int_field("top")?, 3);
        assert_eq!(cfg.str_field("sep")?, ";");
        Ok(())
    }

    #[test]
    fn bool_flags_flip_their_default() -> Result<()> {
        let cfg = parse_config(&SPEC, ["wordcount", "in.txt"])?;
        assert!(!cfg.bool_field("unique")?);
        assert!(cfg.bool_field("fold_case")?);

        let cfg = parse_config(&SPEC, ["wordcount", "in.txt", "--unique", "--fold_case"])?;
        assert!(cfg.bool_field("unique")?);
        assert!(!cfg.bool_field("fold_case")?);
        Ok(())
    }

    #[test]
    fn defaults_can_come_from_the_environment() -> Result<()> {
        static ENV_SPEC: TaskSpec = TaskSpec {
            name: "envdemo",
            fields: &[FieldSpec {
                name: "level",
                kind: FieldKind::Int,
                default: Some("1"),
                help: "",
            }],
            groups: &[],
            outputs: &[],
        };

        std::env::set_var("ENVDEMO_LEVEL", "7");
        let cfg = parse_config(&ENV_SPEC, ["envdemo"]);
        std::env::remove_var("ENVDEMO_LEVEL");

        assert_eq!(cfg?.int_field("level")?, 7);
        Ok(())
    }

    #[test]
    fn grouped_fields_render_under_their_heading() {
        let cmd = to_command(&SPEC);
        let sep = cmd
            .get_arguments()
            .find(|a| a.get_id().as_str() == "sep")
            .unwrap();
        assert_eq!(sep.get_help_heading(), Some("output"));
    }

    #[test]
    fn bad_int_value_is_an_error() {
        assert!(parse_config(&SPEC, ["wordcount", "in.txt", "--top", "many"]).is_err());
    }
}
