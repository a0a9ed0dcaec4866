use super::{Loader, Table, WatchTarget};
use crate::error::{ConfigError, Result};
use crate::parse::parse_str;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads a `key = value` file.
#[derive(Debug, Clone)]
pub struct FileLoader {
    path: PathBuf,
    watch: bool,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>, watch: bool) -> Self {
        Self {
            path: path.into(),
            watch,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Loader for FileLoader {
    fn parse(&self) -> Result<Table> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| ConfigError::io(&self.path, e))?;
        let table = parse_str(&self.path.display().to_string(), &content)?;
        debug!(
            "Parsed {} setting(s) from {}",
            table.len(),
            self.path.display()
        );
        Ok(table)
    }

    fn is_watchable(&self) -> bool {
        self.watch
    }

    fn target(&self) -> WatchTarget {
        WatchTarget::File(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_file_loader_reads_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.conf");
        std::fs::write(&path, "# comment\nname = demo\nport = 0x1F90\n").unwrap();

        let loader = FileLoader::new(&path, true);
        let table = loader.parse().unwrap();
        assert_eq!(table["name"], "demo");
        assert_eq!(table["port"], "0x1F90");
        assert!(loader.is_watchable());
        assert_eq!(loader.target(), WatchTarget::File(path));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let loader = FileLoader::new(temp.path().join("nope.conf"), false);

        match loader.parse() {
            Err(ConfigError::Io { path, source }) => {
                assert!(path.ends_with("nope.conf"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_names_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.conf");
        std::fs::write(&path, "ok = 1\nbroken\n").unwrap();

        match FileLoader::new(&path, false).parse() {
            Err(ConfigError::Parse(err)) => {
                assert!(err.origin.ends_with("broken.conf"));
                assert_eq!(err.line, 2);
                assert_eq!(err.kind, ParseErrorKind::MissingSeparator);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
