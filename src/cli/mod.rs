//! CLI command definitions for layerconf
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::format::OutputFormat;
use crate::logging::LogTarget;
use crate::source::{EnvLoader, FileLoader, Loader, StringLoader};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// A configuration source given on the command line.
///
/// Syntax:
/// - `file:PATH` / `file+watch:PATH`
/// - `env` / `env:PREFIX` / `env+watch` / `env+watch:PREFIX`
/// - `string:TEXT` (`\n` in TEXT separates lines)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    File { path: PathBuf, watch: bool },
    Env { prefix: String, watch: bool },
    Inline(String),
}

impl std::str::FromStr for SourceSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (s, None),
        };
        match (kind, arg) {
            ("file", Some(path)) | ("file+watch", Some(path)) if !path.is_empty() => {
                Ok(SourceSpec::File {
                    path: PathBuf::from(path),
                    watch: kind == "file+watch",
                })
            }
            ("env", prefix) | ("env+watch", prefix) => Ok(SourceSpec::Env {
                prefix: prefix.unwrap_or_default().to_string(),
                watch: kind == "env+watch",
            }),
            ("string", Some(text)) => Ok(SourceSpec::Inline(text.replace("\\n", "\n"))),
            _ => Err(format!(
                "Invalid source '{}'. Expected file:PATH, file+watch:PATH, env[:PREFIX], \
                 env+watch[:PREFIX] or string:TEXT",
                s
            )),
        }
    }
}

impl SourceSpec {
    pub fn into_loader(self) -> Box<dyn Loader> {
        match self {
            SourceSpec::File { path, watch } => Box::new(FileLoader::new(path, watch)),
            SourceSpec::Env { prefix, watch } => Box::new(EnvLoader::new(watch, prefix)),
            SourceSpec::Inline(text) => Box::new(StringLoader::new(text)),
        }
    }
}

/// Layered key/value configuration inspector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration source (repeatable, later sources win)
    #[arg(short, long = "source", value_name = "SOURCE", global = true)]
    pub sources: Vec<SourceSpec>,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: LogTarget,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the merged settings
    Dump,

    /// Print a single value, converted to a type
    Get(GetArgs),

    /// Print changes as watchable sources are modified
    Watch(WatchArgs),
}

/// Type to convert a value to for `get`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ValueType {
    #[default]
    String,
    Bool,
    Int,
    Float,
    Duration,
}

/// Arguments for the get subcommand
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Setting key
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Type to convert the value to
    #[arg(long = "as", value_enum, default_value_t = ValueType::String)]
    pub value_type: ValueType,
}

/// Arguments for the watch subcommand
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Debounce window for file changes, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub debounce_ms: u64,

    /// Environment poll interval, in seconds
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_secs: u64,
}
