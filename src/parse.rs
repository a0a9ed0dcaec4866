//! `key = value` text grammar shared by file and inline sources.
//!
//! ```text
//! # comment
//! server.host = localhost
//! server.port = 8080
//! motd = "first line
//! second line"
//! ```
//!
//! Keys and values are trimmed and kept as raw strings. A value starting
//! with `"` is quoted: it may span lines and understands `\\ \" \n \r \t`.

use crate::error::{ParseError, ParseErrorKind};
use crate::source::Table;
use std::collections::BTreeMap;

const COMMENT_MARKER: char = '#';

/// Parse `key = value` text into a table.
///
/// `origin` names the source in error messages.
pub fn parse_str(origin: &str, text: &str) -> Result<Table, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut table = Table::new();
    let mut lines = text.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let line_no = index + 1;
        let error = |kind| ParseError {
            origin: origin.to_string(),
            line: line_no,
            kind,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| error(ParseErrorKind::MissingSeparator))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(error(ParseErrorKind::EmptyKey));
        }

        // Quoted values keep their inner whitespace, so only trim the front.
        let value = match value.trim_start().strip_prefix('"') {
            Some(quoted) => read_quoted(quoted, &mut lines).map_err(error)?,
            None => value.trim().to_string(),
        };

        table.insert(key.to_string(), value);
    }

    Ok(table)
}

/// Read a quoted value whose opening quote has been consumed.
///
/// Pulls further lines from `lines` until the closing quote.
fn read_quoted<'a>(
    first: &'a str,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> Result<String, ParseErrorKind> {
    let mut value = String::new();
    let mut current = first;

    loop {
        let mut chars = current.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    let rest = chars.as_str();
                    if !rest.trim().is_empty() {
                        return Err(ParseErrorKind::TrailingCharacters);
                    }
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some(other) => return Err(ParseErrorKind::InvalidEscape(other)),
                    None => return Err(ParseErrorKind::InvalidEscape('\n')),
                },
                other => value.push(other),
            }
        }

        match lines.next() {
            Some((_, next)) => {
                value.push('\n');
                current = next;
            }
            None => return Err(ParseErrorKind::UnterminatedQuote),
        }
    }
}

/// Whether a value must be quoted to survive [`parse_str`] unchanged.
fn needs_quotes(value: &str) -> bool {
    value.trim() != value
        || value.starts_with('"')
        || value.contains(['\n', '\r', '\t'])
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Render a table back to text, keys sorted.
///
/// The output parses back to the same table for keys that are trimmed,
/// non-empty, free of `=` and line breaks, and not starting with `#`.
pub fn render(table: &Table) -> String {
    let sorted: BTreeMap<&String, &String> = table.iter().collect();
    let mut out = String::new();
    for (key, value) in sorted {
        out.push_str(key);
        out.push_str(" = ");
        if needs_quotes(value) {
            out.push_str(&quote(value));
        } else {
            out.push_str(value);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Table {
        parse_str("<test>", text).unwrap()
    }

    #[test]
    fn test_parse_basic_pairs() {
        let table = parse(
            r#"
# database settings
db.host = localhost
   db.port=5432

empty =
"#,
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table["db.host"], "localhost");
        assert_eq!(table["db.port"], "5432");
        assert_eq!(table["empty"], "");
    }

    #[test]
    fn test_value_split_on_first_separator() {
        let table = parse("url = postgres://u:p@host/db?opt=1");
        assert_eq!(table["url"], "postgres://u:p@host/db?opt=1");
    }

    #[test]
    fn test_inline_hash_is_part_of_value() {
        let table = parse("color = #ff0000");
        assert_eq!(table["color"], "#ff0000");
    }

    #[test]
    fn test_later_duplicate_wins() {
        let table = parse("a = 1\na = 2\n");
        assert_eq!(table["a"], "2");
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let table = parse("Key = upper\nkey = lower\n");
        assert_eq!(table["Key"], "upper");
        assert_eq!(table["key"], "lower");
    }

    #[test]
    fn test_quoted_multiline_value() {
        let table = parse("key.multiline = \"first\nsecond\\tindented\"\nnext = 1\n");
        assert_eq!(table["key.multiline"], "first\nsecond\tindented");
        assert_eq!(table["next"], "1");
    }

    #[test]
    fn test_quoted_value_keeps_whitespace() {
        let table = parse(r#"pad = "  spaced  ""#);
        assert_eq!(table["pad"], "  spaced  ");
    }

    #[test]
    fn test_crlf_and_bom() {
        let table = parse("\u{feff}a = 1\r\nb = 2\r\n");
        assert_eq!(table["a"], "1");
        assert_eq!(table["b"], "2");
    }

    #[test]
    fn test_missing_separator_reports_line() {
        let err = parse_str("app.conf", "a = 1\n\njust words\n").unwrap_err();
        assert_eq!(err.origin, "app.conf");
        assert_eq!(err.line, 3);
        assert_eq!(err.kind, ParseErrorKind::MissingSeparator);
    }

    #[test]
    fn test_empty_key() {
        let err = parse_str("<test>", " = value").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyKey);
    }

    #[test]
    fn test_quote_errors() {
        let err = parse_str("<test>", "a = 1\nb = \"open\nstill open").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ParseErrorKind::UnterminatedQuote);

        let err = parse_str("<test>", r#"a = "bad \q""#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidEscape('q'));

        let err = parse_str("<test>", r#"a = "done" extra"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TrailingCharacters);
    }

    #[test]
    fn test_render_round_trip() {
        let mut table = Table::new();
        table.insert("plain".to_string(), "value".to_string());
        table.insert("multi".to_string(), "a\nb".to_string());
        table.insert("quoted".to_string(), "\"hi\" \\ there".to_string());
        table.insert("padded".to_string(), " x ".to_string());
        table.insert("empty".to_string(), String::new());

        let text = render(&table);
        assert!(text.starts_with("empty = \n"));
        assert_eq!(parse(&text), table);
    }
}
