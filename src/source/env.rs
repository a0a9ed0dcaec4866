use super::{Loader, Table, WatchTarget};
use crate::error::Result;
use tracing::debug;

/// Which part of a `KEY=VALUE` entry the prefix is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixScope {
    /// Match the variable name only.
    #[default]
    Key,
    /// Match the whole `KEY=VALUE` line. A short prefix can then also
    /// select a variable through its value when the key is shorter than
    /// the prefix (e.g. prefix `A=1` selects `A=1x`).
    Line,
}

/// Loads settings from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    watch: bool,
    prefix: String,
    scope: PrefixScope,
    /// Fixed snapshot used instead of the process environment.
    vars: Option<Vec<(String, String)>>,
}

impl EnvLoader {
    /// Read the process environment, keeping variables that start with
    /// `prefix` (case-insensitive). An empty prefix keeps everything.
    pub fn new(watch: bool, prefix: impl Into<String>) -> Self {
        Self {
            watch,
            prefix: prefix.into(),
            scope: PrefixScope::default(),
            vars: None,
        }
    }

    /// Use a fixed set of variables instead of the process environment.
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            watch: false,
            prefix: prefix.into(),
            scope: PrefixScope::default(),
            vars: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn with_scope(mut self, scope: PrefixScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn matches(&self, key: &str, value: &str) -> bool {
        if self.prefix.is_empty() {
            return true;
        }
        let prefix = self.prefix.to_lowercase();
        match self.scope {
            PrefixScope::Key => key.to_lowercase().starts_with(&prefix),
            PrefixScope::Line => format!("{}={}", key, value)
                .to_lowercase()
                .starts_with(&prefix),
        }
    }

    fn snapshot(&self) -> Vec<(String, String)> {
        if let Some(ref vars) = self.vars {
            return vars.clone();
        }
        std::env::vars_os()
            .filter_map(|(k, v)| match (k.into_string(), v.into_string()) {
                (Ok(k), Ok(v)) => Some((k, v)),
                (k, _) => {
                    debug!("Skipping non UTF-8 environment variable {:?}", k);
                    None
                }
            })
            .collect()
    }
}

impl Loader for EnvLoader {
    fn parse(&self) -> Result<Table> {
        let table: Table = self
            .snapshot()
            .into_iter()
            .filter(|(k, v)| self.matches(k, v))
            .collect();
        debug!(
            "Collected {} environment variable(s) with prefix {:?}",
            table.len(),
            self.prefix
        );
        Ok(table)
    }

    fn is_watchable(&self) -> bool {
        self.watch
    }

    fn target(&self) -> WatchTarget {
        WatchTarget::Environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<(&'static str, &'static str)> {
        vec![
            ("APPDEBUG", "true"),
            ("app_name", "demo"),
            ("OTHER", "x"),
            ("A", "PPLE=1"),
        ]
    }

    #[test]
    fn test_prefix_filters_by_key() {
        let table = EnvLoader::from_vars("APP", sample()).parse().unwrap();
        assert_eq!(table.get("APPDEBUG").map(String::as_str), Some("true"));
        assert_eq!(table.get("app_name").map(String::as_str), Some("demo"));
        assert!(!table.contains_key("OTHER"));
        assert!(!table.contains_key("A"));
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let table = EnvLoader::from_vars("app", sample()).parse().unwrap();
        assert!(table.contains_key("APPDEBUG"));
        assert!(table.contains_key("app_name"));
    }

    #[test]
    fn test_line_scope_can_match_through_value() {
        let table = EnvLoader::from_vars("a=pp", sample())
            .with_scope(PrefixScope::Line)
            .parse()
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table["A"], "PPLE=1");

        let table = EnvLoader::from_vars("APP", sample())
            .with_scope(PrefixScope::Line)
            .parse()
            .unwrap();
        assert!(table.contains_key("APPDEBUG"));
        assert!(!table.contains_key("OTHER"));
    }

    #[test]
    fn test_empty_prefix_keeps_everything() {
        let table = EnvLoader::from_vars("", sample()).parse().unwrap();
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_values_are_verbatim() {
        let table = EnvLoader::from_vars("", vec![("PADDED", "  spaced = yes ")])
            .parse()
            .unwrap();
        assert_eq!(table["PADDED"], "  spaced = yes ");
    }

    #[test]
    fn test_watch_flag_and_target() {
        let loader = EnvLoader::new(true, "APP");
        assert!(loader.is_watchable());
        assert_eq!(loader.target(), WatchTarget::Environment);
        assert!(!EnvLoader::new(false, "").is_watchable());
    }
}
