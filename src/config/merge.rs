//! Flat table merging.
//!
//! Tables are folded in order: a key in a later table replaces the same key
//! from any earlier one. Keys are compared exactly (case-sensitive).

use crate::source::Table;

/// Merge `overlay` into `base`, with `overlay` taking precedence.
///
/// # Example
/// ```
/// use layerconf::config::merge;
/// use layerconf::source::Table;
///
/// let base = Table::from([("a".into(), "1".into()), ("b".into(), "2".into())]);
/// let overlay = Table::from([("b".into(), "3".into())]);
/// let merged = merge(base, overlay);
/// assert_eq!(merged["a"], "1");
/// assert_eq!(merged["b"], "3");
/// ```
pub fn merge(mut base: Table, overlay: Table) -> Table {
    base.extend(overlay);
    base
}

/// Merge multiple tables in order, with later tables taking precedence.
///
/// Equivalent to folding [`merge`] over the list.
pub fn merge_all(tables: impl IntoIterator<Item = Table>) -> Table {
    tables.into_iter().fold(Table::new(), merge)
}

/// Keys whose value differs between two tables, sorted.
///
/// Covers keys added, removed, or changed.
pub fn changed_keys(before: &Table, after: &Table) -> Vec<String> {
    let mut keys: Vec<String> = after
        .iter()
        .filter(|(k, v)| before.get(*k) != Some(*v))
        .map(|(k, _)| k.clone())
        .chain(
            before
                .keys()
                .filter(|k| !after.contains_key(*k))
                .cloned(),
        )
        .collect();
    keys.sort();
    keys
}
