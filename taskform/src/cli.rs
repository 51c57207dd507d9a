//! Command line interface.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use jschema::{
    FormOptions, SchemaDraft, SchemaManager, SchemaValidator, Value, adapt_schema,
};

use crate::{render, session};

#[derive(Parser, Debug)]
#[command(name = "taskform")]
#[command(version, about = "Check task argument schemas and build argument objects")]
pub struct Cli {
    /// TOML file with form options.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a schema and report whether it is well-formed.
    Check {
        schema: PathBuf,
        #[arg(long, value_enum)]
        draft: Option<DraftArg>,
    },
    /// Print the schema with every `$ref` and `allOf` resolved.
    Normalize {
        schema: PathBuf,
        /// Top-level property to drop (repeatable).
        #[arg(long = "ignore")]
        ignore: Vec<String>,
    },
    /// Print the form fields of a schema and its data.
    Fields {
        schema: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Build the argument object.
    Args {
        schema: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        /// `PATH=VALUE` edit applied before output (repeatable). Paths use
        /// `###` between segments.
        #[arg(long = "set")]
        set: Vec<String>,
        /// Validate the arguments against the schema.
        #[arg(long)]
        validate: bool,
        /// Write the arguments here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftArg {
    #[value(name = "draft7")]
    Draft7,
    #[value(name = "draft2020-12")]
    Draft202012,
}

impl From<DraftArg> for SchemaDraft {
    fn from(draft: DraftArg) -> Self {
        match draft {
            DraftArg::Draft7 => SchemaDraft::Draft7,
            DraftArg::Draft202012 => SchemaDraft::Draft202012,
        }
    }
}

impl Cli {
    /// Log filter selected by `-v`.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        let options = session::load_options(self.config.as_deref())?;
        debug!("form options: {options:?}");

        match self.command {
            Command::Check { schema, draft } => {
                let draft = draft.map(SchemaDraft::from).unwrap_or(options.draft);
                check(&schema, draft)
            }
            Command::Normalize { schema, ignore } => {
                let mut ignored = options.ignored_properties;
                ignored.extend(ignore);
                let normalized = adapt_schema(&session::read_document(&schema)?, &ignored)?;
                println!("{}", serde_json::to_string_pretty(&normalized)?);
                Ok(())
            }
            Command::Fields { schema, data } => {
                let manager = open(&schema, data.as_deref(), &options)?;
                print!("{}", render::field_tree(&manager.fields()));
                Ok(())
            }
            Command::Args {
                schema,
                data,
                set,
                validate,
                output,
            } => {
                let arguments = build_arguments(&schema, data.as_deref(), &set, validate, &options)?;
                match output {
                    Some(path) => {
                        if let Some(backup) = session::write_document(&path, &arguments)? {
                            println!("{} {}", "backup:".dimmed(), backup.display());
                        }
                        println!("{} {}", "written:".green().bold(), path.display());
                    }
                    None => println!("{}", serde_json::to_string_pretty(&arguments)?),
                }
                Ok(())
            }
        }
    }
}

fn check(schema: &Path, draft: SchemaDraft) -> anyhow::Result<()> {
    let document = session::read_document(schema)?;
    let mut validator = SchemaValidator::new(draft, true);
    validator
        .try_load_schema(&document)
        .with_context(|| format!("{} is not a valid schema", schema.display()))?;
    println!("{} {}", "valid:".green().bold(), schema.display());
    Ok(())
}

/// Open a schema manager over a schema file and an optional data file.
pub fn open(
    schema: &Path,
    data: Option<&Path>,
    options: &FormOptions,
) -> anyhow::Result<SchemaManager> {
    let document = session::read_document(schema)?;
    let data = match data {
        Some(path) => session::read_data(path)?,
        None => Value::Object(Default::default()),
    };
    SchemaManager::with_options(Some(document), Some(data), options)
        .with_context(|| format!("Failed to build a form from {}", schema.display()))
}

/// Apply `PATH=VALUE` edits and return the argument object.
pub fn build_arguments(
    schema: &Path,
    data: Option<&Path>,
    assignments: &[String],
    validate: bool,
    options: &FormOptions,
) -> anyhow::Result<Value> {
    let mut manager = open(schema, data, options)?;
    for assignment in assignments {
        let (path, value) = session::parse_assignment(assignment)?;
        manager
            .set_value(&path, value)
            .with_context(|| format!("Cannot apply {assignment:?}"))?;
    }
    if validate {
        manager.validate()?;
    }
    Ok(manager.get_arguments())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_command() {
        let cli = Cli::try_parse_from([
            "taskform",
            "-vv",
            "args",
            "schema.json",
            "--data",
            "data.toml",
            "--set",
            "a###0=1",
            "--set",
            "b=x",
            "--validate",
        ])
        .unwrap();
        assert_eq!(cli.log_level(), log::LevelFilter::Trace);
        let Command::Args {
            schema,
            data,
            set,
            validate,
            output,
        } = cli.command
        else {
            panic!("expected the args command");
        };
        assert_eq!(schema, PathBuf::from("schema.json"));
        assert_eq!(data, Some(PathBuf::from("data.toml")));
        assert_eq!(set, ["a###0=1", "b=x"]);
        assert!(validate);
        assert_eq!(output, None);
    }

    #[test]
    fn test_parse_check_draft() {
        let cli = Cli::try_parse_from(["taskform", "check", "s.json", "--draft", "draft7"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Check {
                draft: Some(DraftArg::Draft7),
                ..
            }
        ));
        assert!(Cli::try_parse_from(["taskform", "check", "s.json", "--draft", "v3"]).is_err());
    }
}
