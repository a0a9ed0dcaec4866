//! Change watcher for watchable sources.
//!
//! Watches:
//! - files of watchable file loaders, through `notify` with debouncing
//! - the process environment, by polling, when an environment loader is
//!   watchable
//!
//! Every detected change re-runs [`Config::reload`] and emits a
//! [`ReloadEvent`] through a tokio watch channel.

use super::loader::Config;
use crate::source::WatchTarget;
use notify::RecommendedWatcher;
use notify_debouncer_mini::{DebouncedEventKind, Debouncer, new_debouncer};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// What caused a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadTrigger {
    /// One or more watched files changed.
    Files(Vec<PathBuf>),
    /// The periodic environment poll.
    EnvironmentPoll,
}

/// Events emitted by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// A new snapshot was published.
    Reloaded {
        trigger: ReloadTrigger,
        changed_keys: Vec<String>,
    },
    /// Reload failed; the previous snapshot is still current.
    Failed {
        trigger: ReloadTrigger,
        message: String,
    },
    /// The file watcher itself reported an error.
    WatcherError(String),
}

impl ReloadEvent {
    /// Returns true if a new snapshot was published.
    pub fn is_reloaded(&self) -> bool {
        matches!(self, ReloadEvent::Reloaded { .. })
    }
}

/// Configuration for the watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce duration for coalescing rapid file changes.
    pub debounce_duration: Duration,
    /// How often the environment is re-read.
    pub poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(500),
            poll_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("no watchable sources")]
    NothingToWatch,
}

/// Handle to a running watcher.
///
/// Dropping the handle stops watching.
pub struct WatcherHandle {
    /// Receiver for reload events.
    pub events: watch::Receiver<Option<ReloadEvent>>,
    files: Vec<PathBuf>,
    _debouncer: Option<Debouncer<RecommendedWatcher>>,
    _file_task: Option<JoinHandle<()>>,
    poll_task: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    /// Wait for the next reload event.
    pub async fn wait_for_change(&mut self) -> Option<ReloadEvent> {
        // Skip the initial None value
        loop {
            if self.events.changed().await.is_err() {
                return None; // Sender dropped
            }
            let event = self.events.borrow().clone();
            if event.is_some() {
                return event;
            }
        }
    }

    /// Get the latest event without waiting.
    pub fn latest_event(&self) -> Option<ReloadEvent> {
        self.events.borrow().clone()
    }

    /// Resolved paths of the watched files.
    pub fn watched_files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Whether the environment is being polled.
    pub fn is_polling(&self) -> bool {
        self.poll_task.is_some()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }
}

/// Starts watching the watchable sources of `config`.
///
/// Must be called from within a tokio runtime.
///
/// # Example
/// ```ignore
/// let config = Arc::new(layerconf::load([source::file("app.conf", true)])?);
/// let mut handle = start_watcher(Arc::clone(&config), WatcherConfig::default())?;
/// while let Some(event) = handle.wait_for_change().await {
///     if event.is_reloaded() {
///         println!("now: {:?}", config.get_string("level"));
///     }
/// }
/// ```
pub fn start_watcher(
    config: Arc<Config>,
    watcher_config: WatcherConfig,
) -> Result<WatcherHandle, WatchError> {
    let targets = config.watch_set();
    let files: Vec<PathBuf> = targets
        .iter()
        .filter_map(WatchTarget::path)
        .map(resolve_path)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let poll_env = targets.contains(&WatchTarget::Environment);

    if files.is_empty() && !poll_env {
        return Err(WatchError::NothingToWatch);
    }

    let (event_tx, event_rx) = watch::channel(None);
    let event_tx = Arc::new(event_tx);

    let mut debouncer = None;
    let mut file_task = None;
    if !files.is_empty() {
        let (notify_tx, notify_rx) = mpsc::channel();
        let mut created = new_debouncer(watcher_config.debounce_duration, notify_tx)?;

        let watcher = created.watcher();
        let dirs: BTreeSet<&Path> = files.iter().filter_map(|f| f.parent()).collect();
        for dir in dirs {
            if dir.exists() {
                info!("Watching config directory: {}", dir.display());
                watcher.watch(dir, notify::RecursiveMode::NonRecursive)?;
            } else {
                warn!(
                    "Config directory does not exist, skipping watch: {}",
                    dir.display()
                );
            }
        }

        let config = Arc::clone(&config);
        let tx = Arc::clone(&event_tx);
        let watched = files.clone();
        file_task = Some(tokio::task::spawn_blocking(move || {
            process_notify_events(notify_rx, &tx, &config, &watched);
        }));
        debouncer = Some(created);
    }

    let poll_task = poll_env.then(|| {
        info!(
            "Polling environment every {:?}",
            watcher_config.poll_interval
        );
        tokio::spawn(poll_environment(
            config,
            Arc::clone(&event_tx),
            watcher_config.poll_interval,
        ))
    });

    Ok(WatcherHandle {
        events: event_rx,
        files,
        _debouncer: debouncer,
        _file_task: file_task,
        poll_task,
    })
}

/// Absolute, symlink-free form of a watched file path.
///
/// Only the parent directory is canonicalized so a file that is briefly
/// missing (editors replacing it) still resolves the same way.
fn resolve_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let resolved = match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent.canonicalize().ok().map(|p| p.join(name)),
        _ => None,
    };
    resolved.unwrap_or(absolute)
}

/// Reload and publish the outcome. Returns false once nobody listens.
fn publish(
    config: &Config,
    tx: &watch::Sender<Option<ReloadEvent>>,
    trigger: ReloadTrigger,
    only_if_changed: bool,
) -> bool {
    let event = match config.reload() {
        Ok(outcome) => {
            if only_if_changed && !outcome.is_changed() {
                return !tx.is_closed();
            }
            ReloadEvent::Reloaded {
                trigger,
                changed_keys: outcome.changed_keys,
            }
        }
        Err(e) => {
            warn!("Config reload failed, keeping previous settings: {}", e);
            ReloadEvent::Failed {
                trigger,
                message: e.to_string(),
            }
        }
    };
    debug!("Publishing reload event: {:?}", event);
    tx.send(Some(event)).is_ok()
}

/// Process events from the notify debouncer and reload on relevant changes.
fn process_notify_events(
    rx: mpsc::Receiver<Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>>,
    tx: &watch::Sender<Option<ReloadEvent>>,
    config: &Config,
    watched: &[PathBuf],
) {
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let paths = events
                    .into_iter()
                    .filter(|event| {
                        matches!(
                            event.kind,
                            DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
                        )
                    })
                    .map(|event| event.path);
                let changed = relevant_paths(paths, watched);
                if changed.is_empty() {
                    continue;
                }
                info!("Config file change detected: {:?}", changed);
                if !publish(config, tx, ReloadTrigger::Files(changed), false) {
                    // Receiver dropped, exit
                    info!("Config watcher receiver dropped, stopping");
                    return;
                }
            }
            Ok(Err(e)) => {
                error!("File watcher error: {}", e);
                let _ = tx.send(Some(ReloadEvent::WatcherError(e.to_string())));
            }
            Err(_) => {
                // Channel closed, exit
                info!("Config watcher channel closed, stopping");
                return;
            }
        }
    }
}

/// Watched files among `paths`, sorted and unique.
fn relevant_paths(paths: impl IntoIterator<Item = PathBuf>, watched: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| watched.contains(path))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

async fn poll_environment(
    config: Arc<Config>,
    tx: Arc<watch::Sender<Option<ReloadEvent>>>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the initial load already ran.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let config = Arc::clone(&config);
        let tx = Arc::clone(&tx);
        let keep_going = tokio::task::spawn_blocking(move || {
            publish(&config, &tx, ReloadTrigger::EnvironmentPoll, true)
        })
        .await
        .unwrap_or(false);
        if !keep_going {
            info!("Environment poller stopping");
            return;
        }
    }
}
