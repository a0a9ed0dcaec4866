use super::{Loader, Table, WatchTarget};
use crate::error::Result;
use crate::parse::parse_str;

/// Origin name used in parse errors for inline text.
pub const INLINE_ORIGIN: &str = "<inline>";

/// Loads inline `key = value` text.
#[derive(Debug, Clone)]
pub struct StringLoader {
    text: String,
}

impl StringLoader {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Loader for StringLoader {
    fn parse(&self) -> Result<Table> {
        Ok(parse_str(INLINE_ORIGIN, &self.text)?)
    }

    fn is_watchable(&self) -> bool {
        false
    }

    fn target(&self) -> WatchTarget {
        WatchTarget::Inline
    }
}
