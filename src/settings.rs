//! Resolved, immutable settings table and its typed accessors.

use crate::bind::{FieldPolicy, Unmarshal};
use crate::coerce::FromSetting;
use crate::error::{InvalidValue, UnmarshalError};
use crate::source::Table;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

/// Result of a typed lookup.
///
/// Separates a key that is not set from one whose value does not convert.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Present(T),
    Absent,
    Malformed { raw: String, error: InvalidValue },
}

impl<T> Lookup<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Lookup::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Lookup::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Lookup::Malformed { .. })
    }
}

impl<T: Default> Lookup<T> {
    /// `(value, true)` when present, otherwise `(T::default(), false)`.
    pub fn into_parts(self) -> (T, bool) {
        match self {
            Lookup::Present(value) => (value, true),
            _ => (T::default(), false),
        }
    }
}

/// Merged settings from every source of one load.
///
/// Never changes after construction; a reload builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    table: Table,
}

impl Settings {
    pub fn new(table: Table) -> Self {
        Self { table }
    }

    /// Raw string value.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.table.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.table.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Entries in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sorted().into_iter()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    fn sorted(&self) -> BTreeMap<&str, &str> {
        self.table
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Typed lookup distinguishing absent from malformed.
    pub fn lookup<T: FromSetting>(&self, key: &str) -> Lookup<T> {
        match self.table.get(key) {
            None => Lookup::Absent,
            Some(raw) => match T::from_setting(raw) {
                Ok(value) => Lookup::Present(value),
                Err(error) => Lookup::Malformed {
                    raw: raw.clone(),
                    error,
                },
            },
        }
    }

    /// Typed value, `None` when absent or malformed.
    pub fn get<T: FromSetting>(&self, key: &str) -> Option<T> {
        self.lookup(key).ok()
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

    /// Populate `target` from these settings, assigning every field that
    /// converts and reporting the rest.
    pub fn unmarshal<T: Unmarshal>(&self, target: &mut T) -> Result<(), UnmarshalError> {
        self.unmarshal_with(target, FieldPolicy::Lenient)
    }

    pub fn unmarshal_with<T: Unmarshal>(
        &self,
        target: &mut T,
        policy: FieldPolicy,
    ) -> Result<(), UnmarshalError> {
        crate::bind::unmarshal(self, target, policy)
    }
}

impl From<Table> for Settings {
    fn from(table: Table) -> Self {
        Self::new(table)
    }
}

impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sorted().serialize(serializer)
    }
}
