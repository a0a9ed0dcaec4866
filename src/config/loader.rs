//! Source aggregation.
//!
//! Runs every loader in order, merges their tables last-writer-wins and
//! publishes the result as an immutable [`Settings`] snapshot.

use super::merge::{changed_keys, merge_all};
use crate::bind::{FieldPolicy, Unmarshal};
use crate::coerce::FromSetting;
use crate::error::Result;
use crate::settings::{Lookup, Settings};
use crate::source::{Loader, Table, WatchTarget};
use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Aggregated configuration.
///
/// Holds the loaders it was built from so that [`Config::reload`] can
/// rebuild the snapshot. Readers get an `Arc<Settings>` that never
/// changes; a reload swaps in a new one.
#[derive(Debug)]
pub struct Config {
    loaders: Vec<Box<dyn Loader>>,
    current: ArcSwap<Settings>,
    /// Serializes reloads so a slow one cannot publish over a newer one.
    reload_lock: Mutex<()>,
}

/// Snapshots on either side of a reload.
#[derive(Debug, Clone)]
pub struct ReloadOutcome {
    pub previous: Arc<Settings>,
    pub current: Arc<Settings>,
    /// Keys added, removed or changed, sorted.
    pub changed_keys: Vec<String>,
}

impl ReloadOutcome {
    pub fn is_changed(&self) -> bool {
        !self.changed_keys.is_empty()
    }
}

/// Run every loader in order and fold the tables.
///
/// Stops at the first failing loader and returns its error.
fn aggregate(loaders: &[Box<dyn Loader>]) -> Result<Table> {
    let mut tables = Vec::with_capacity(loaders.len());
    for loader in loaders {
        let table = loader.parse()?;
        debug!("Loaded {} setting(s) from {}", table.len(), loader.target());
        tables.push(table);
    }
    Ok(merge_all(tables))
}

impl Config {
    /// Load configuration from `loaders`, later loaders taking precedence.
    pub fn load(loaders: impl IntoIterator<Item = Box<dyn Loader>>) -> Result<Self> {
        let loaders: Vec<Box<dyn Loader>> = loaders.into_iter().collect();
        let table = aggregate(&loaders)?;
        info!(
            "Loaded {} setting(s) from {} source(s)",
            table.len(),
            loaders.len()
        );
        Ok(Self {
            loaders,
            current: ArcSwap::from_pointee(Settings::new(table)),
            reload_lock: Mutex::new(()),
        })
    }

    /// Re-run every loader and publish a new snapshot.
    ///
    /// On failure the current snapshot stays in place.
    pub fn reload(&self) -> Result<ReloadOutcome> {
        // Held across aggregate and swap; readers never take it.
        let _guard = self.reload_lock.lock().unwrap_or_else(|e| e.into_inner());
        let table = aggregate(&self.loaders)?;
        let current = Arc::new(Settings::new(table));
        let previous = self.current.swap(Arc::clone(&current));
        let changed_keys = changed_keys(previous.table(), current.table());
        info!(
            "Reloaded configuration: {} setting(s), {} changed",
            current.len(),
            changed_keys.len()
        );
        Ok(ReloadOutcome {
            previous,
            current,
            changed_keys,
        })
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Settings> {
        self.current.load_full()
    }

    pub fn loaders(&self) -> &[Box<dyn Loader>] {
        &self.loaders
    }

    /// Targets of the watchable loaders, in loader order.
    pub fn watch_set(&self) -> Vec<WatchTarget> {
        self.loaders
            .iter()
            .filter(|l| l.is_watchable())
            .map(|l| l.target())
            .collect()
    }

    /// Whether any loader is watchable.
    pub fn is_watchable(&self) -> bool {
        self.loaders.iter().any(|l| l.is_watchable())
    }

    /// Populate `target` from the current snapshot.
    ///
    /// Field failures come back as [`ConfigError::Unmarshal`](crate::ConfigError::Unmarshal).
    pub fn unmarshal<T: Unmarshal>(&self, target: &mut T) -> Result<()> {
        self.unmarshal_with(target, FieldPolicy::Lenient)
    }

    pub fn unmarshal_with<T: Unmarshal>(&self, target: &mut T, policy: FieldPolicy) -> Result<()> {
        Ok(self.current.load().unmarshal_with(target, policy)?)
    }

    pub fn lookup<T: FromSetting>(&self, key: &str) -> Lookup<T> {
        self.current.load().lookup(key)
    }

    pub fn get<T: FromSetting>(&self, key: &str) -> Option<T> {
        self.current.load().get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key)
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    pub fn get_duration(&self, key: &str) -> Option<Duration> {
        self.get(key)
    }
}

/// Load configuration from `loaders`, later loaders taking precedence.
///
/// ```no_run
/// use layerconf::source;
///
/// let config = layerconf::load([
///     source::file("app.conf", true),
///     source::env(false, "APP"),
///     source::string("test.int.value = 7"),
/// ])?;
/// assert_eq!(config.get_int("test.int.value"), Some(7));
/// # Ok::<(), layerconf::ConfigError>(())
/// ```
pub fn load(loaders: impl IntoIterator<Item = Box<dyn Loader>>) -> Result<Config> {
    Config::load(loaders)
}
