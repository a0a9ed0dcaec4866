//! Aggregated configuration.
//!
//! Runs an ordered list of loaders and merges their tables key by key:
//! 1. Loaders run in the order given
//! 2. A later loader's value replaces an earlier one for the same key
//! 3. The first loader error aborts the load; no partial table is exposed
//!
//! The merged [`Settings`](crate::Settings) are published as an immutable
//! snapshot. [`Config::reload`] rebuilds and swaps it; [`watcher`] drives
//! reloads from file changes and environment polling.

mod loader;
mod merge;
pub mod watcher;

pub use loader::{Config, ReloadOutcome, load};
pub use merge::{changed_keys, merge, merge_all};
