//! Configuration sources.
//!
//! A [`Loader`] produces a flat table of raw string settings. Three are
//! provided:
//! - [`FileLoader`] - `key = value` file on disk
//! - [`EnvLoader`] - process environment, optionally prefix-filtered
//! - [`StringLoader`] - inline `key = value` text

mod env;
mod file;
mod string;

pub use env::{EnvLoader, PrefixScope};
pub use file::FileLoader;
pub use string::StringLoader;

use crate::error::Result;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Flat key/value table produced by a single source.
pub type Table = HashMap<String, String>;

/// What an external watcher must observe to notice a source change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchTarget {
    /// A file on disk.
    File(PathBuf),
    /// The process environment (no change notification; polled).
    Environment,
    /// Fixed text that never changes.
    Inline,
}

impl WatchTarget {
    pub fn path(&self) -> Option<&Path> {
        match self {
            WatchTarget::File(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchTarget::File(path) => write!(f, "file {}", path.display()),
            WatchTarget::Environment => write!(f, "environment"),
            WatchTarget::Inline => write!(f, "inline text"),
        }
    }
}

/// A source of raw string settings.
pub trait Loader: Send + Sync + fmt::Debug {
    /// Read the source into a fresh table.
    fn parse(&self) -> Result<Table>;

    /// Whether the source may change after the initial load.
    fn is_watchable(&self) -> bool;

    /// What backs this source.
    fn target(&self) -> WatchTarget;
}

/// Boxed [`FileLoader`].
pub fn file(path: impl Into<PathBuf>, watch: bool) -> Box<dyn Loader> {
    Box::new(FileLoader::new(path, watch))
}

/// Boxed [`EnvLoader`]; an empty prefix includes every variable.
pub fn env(watch: bool, prefix: &str) -> Box<dyn Loader> {
    Box::new(EnvLoader::new(watch, prefix))
}

/// Boxed [`StringLoader`].
pub fn string(text: impl Into<String>) -> Box<dyn Loader> {
    Box::new(StringLoader::new(text))
}
