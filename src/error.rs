//! Structured error types for loading, parsing and unmarshalling.

use crate::coerce::ValueKind;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Source errors
    SourceUnreadable,
    MalformedText,

    // Value errors
    InvalidValue,
    MissingRequiredField,
}

/// Errors produced while building or refreshing a [`Config`](crate::Config).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A file source could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A text source is not valid `key = value` text.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// One or more bound fields could not be populated.
    #[error(transparent)]
    Unmarshal(#[from] UnmarshalError),
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify the error for machine-readable output.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Io { .. } => ErrorCode::SourceUnreadable,
            ConfigError::Parse(_) => ErrorCode::MalformedText,
            ConfigError::Unmarshal(err) => err.code(),
        }
    }
}

/// What went wrong on a line of `key = value` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The line has no `=`.
    MissingSeparator,
    /// Nothing before the `=`.
    EmptyKey,
    /// A quoted value never closes.
    UnterminatedQuote,
    /// Unknown `\x` escape inside a quoted value.
    InvalidEscape(char),
    /// Something other than whitespace after a closing quote.
    TrailingCharacters,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::MissingSeparator => write!(f, "expected `key = value`"),
            ParseErrorKind::EmptyKey => write!(f, "empty key"),
            ParseErrorKind::UnterminatedQuote => write!(f, "unterminated quoted value"),
            ParseErrorKind::InvalidEscape(c) => write!(f, "invalid escape `\\{}`", c),
            ParseErrorKind::TrailingCharacters => {
                write!(f, "unexpected characters after closing quote")
            }
        }
    }
}

/// Malformed text, with the offending line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{origin}:{line}: {kind}")]
pub struct ParseError {
    /// File path or `<inline>`.
    pub origin: String,
    /// 1-based line number.
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// A raw string that does not convert to the requested kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value {raw:?}: {reason}")]
pub struct InvalidValue {
    pub kind: ValueKind,
    pub raw: String,
    pub reason: &'static str,
}

impl InvalidValue {
    pub fn new(kind: ValueKind, raw: &str, reason: &'static str) -> Self {
        Self {
            kind,
            raw: raw.to_string(),
            reason,
        }
    }
}

/// Coercion failure for a bound field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field `{field}` (key `{key}`): {source}")]
pub struct CoercionError {
    pub field: String,
    pub key: String,
    #[source]
    pub source: InvalidValue,
}

impl CoercionError {
    pub fn kind(&self) -> ValueKind {
        self.source.kind
    }

    pub fn raw(&self) -> &str {
        &self.source.raw
    }
}

/// Per-field unmarshal failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error("field `{field}` is required but key `{key}` is not set")]
    Missing { field: String, key: String },
}

impl FieldError {
    pub fn field(&self) -> &str {
        match self {
            FieldError::Coercion(err) => &err.field,
            FieldError::Missing { field, .. } => field,
        }
    }
}

/// All field failures from one unmarshal call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmarshalError {
    pub failures: Vec<FieldError>,
}

impl UnmarshalError {
    pub fn code(&self) -> ErrorCode {
        if self
            .failures
            .iter()
            .all(|f| matches!(f, FieldError::Missing { .. }))
        {
            ErrorCode::MissingRequiredField
        } else {
            ErrorCode::InvalidValue
        }
    }

    /// Failure for a given field name, if any.
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.failures.iter().find(|f| f.field() == field)
    }
}

impl fmt::Display for UnmarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) failed to unmarshal", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for UnmarshalError {}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
