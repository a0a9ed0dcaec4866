//! Output formatting for settings, values and reload events.

use crate::config::watcher::{ReloadEvent, ReloadTrigger};
use crate::error::ConfigError;
use crate::parse::render;
use crate::settings::Settings;
use crate::source::Table;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// `key = value` text, readable back by the file loader.
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "conf" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: text, json",
                s
            )),
        }
    }
}

/// A value converted for display by `get`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    #[serde(serialize_with = "serialize_duration")]
    Duration(Duration),
    String(String),
}

fn serialize_duration<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedValue::Bool(v) => write!(f, "{}", v),
            TypedValue::Int(v) => write!(f, "{}", v),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Duration(v) => write!(f, "{:?}", v),
            TypedValue::String(v) => write!(f, "{}", v),
        }
    }
}

/// Format the whole settings table.
pub fn format_settings(settings: &Settings, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render(settings.table()),
        OutputFormat::Json => pretty(&json!(settings)),
    }
}

/// Format a single resolved value.
pub fn format_value(key: &str, value: &TypedValue, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{}\n", value),
        OutputFormat::Json => pretty(&json!({ "key": key, "value": value })),
    }
}

fn trigger_json(trigger: &ReloadTrigger) -> Value {
    match trigger {
        ReloadTrigger::Files(paths) => json!({
            "files": paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>()
        }),
        ReloadTrigger::EnvironmentPoll => json!("environment"),
    }
}

fn trigger_text(trigger: &ReloadTrigger) -> String {
    match trigger {
        ReloadTrigger::Files(paths) => paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
        ReloadTrigger::EnvironmentPoll => "environment".to_string(),
    }
}

/// Format a reload event together with the values of the changed keys.
pub fn format_reload_event(
    event: &ReloadEvent,
    settings: &Settings,
    format: OutputFormat,
) -> String {
    match (event, format) {
        (
            ReloadEvent::Reloaded {
                trigger,
                changed_keys,
            },
            OutputFormat::Text,
        ) => {
            let mut out = format!(
                "# reloaded ({}), {} key(s) changed\n",
                trigger_text(trigger),
                changed_keys.len()
            );
            let present: Table = changed_keys
                .iter()
                .filter_map(|k| settings.raw(k).map(|v| (k.clone(), v.to_string())))
                .collect();
            out.push_str(&render(&present));
            for key in changed_keys.iter().filter(|k| !settings.contains(k)) {
                out.push_str(&format!("# removed: {}\n", key));
            }
            out
        }
        (
            ReloadEvent::Reloaded {
                trigger,
                changed_keys,
            },
            OutputFormat::Json,
        ) => {
            let values: serde_json::Map<String, Value> = changed_keys
                .iter()
                .map(|k| {
                    let value = settings.raw(k).map_or(Value::Null, |v| json!(v));
                    (k.clone(), value)
                })
                .collect();
            pretty(&json!({
                "event": "reloaded",
                "trigger": trigger_json(trigger),
                "changed": values,
            }))
        }
        (ReloadEvent::Failed { trigger, message }, OutputFormat::Text) => {
            format!("# reload failed ({}): {}\n", trigger_text(trigger), message)
        }
        (ReloadEvent::Failed { trigger, message }, OutputFormat::Json) => pretty(&json!({
            "event": "failed",
            "trigger": trigger_json(trigger),
            "message": message,
        })),
        (ReloadEvent::WatcherError(message), OutputFormat::Text) => {
            format!("# watcher error: {}\n", message)
        }
        (ReloadEvent::WatcherError(message), OutputFormat::Json) => pretty(&json!({
            "event": "watcher_error",
            "message": message,
        })),
    }
}

/// Format a configuration error.
pub fn format_error(err: &ConfigError, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("error: {}\n", err),
        OutputFormat::Json => pretty(&json!({
            "error": {
                "code": err.code(),
                "message": err.to_string(),
            }
        })),
    }
}

fn pretty(value: &Value) -> String {
    let mut out = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    out.push('\n');
    out
}
