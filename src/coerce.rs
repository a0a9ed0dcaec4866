//! String to typed value coercion.
//!
//! Every source hands out raw strings. [`FromSetting`] turns them into the
//! types bound fields and accessors ask for:
//!
//! - booleans: `1 t true y yes on` / `0 f false n no off`, any case
//! - integers: decimal, `0x` hex, `0o` or leading-`0` octal, `0b` binary
//! - floats: decimal and exponent notation
//! - durations: `<number><unit>` sequences such as `1h30m` or `250ms`

use crate::error::InvalidValue;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Target kind of a coercion, reported in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Uint,
    Float,
    Duration,
    String,
    Path,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "integer",
            ValueKind::Uint => "unsigned integer",
            ValueKind::Float => "float",
            ValueKind::Duration => "duration",
            ValueKind::String => "string",
            ValueKind::Path => "path",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Types that can be produced from a raw setting string.
pub trait FromSetting: Sized {
    const KIND: ValueKind;

    fn from_setting(raw: &str) -> Result<Self, InvalidValue>;
}

/// Parse a boolean literal.
pub fn parse_bool(raw: &str) -> Result<bool, InvalidValue> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "n" | "no" | "off" => Ok(false),
        _ => Err(InvalidValue::new(
            ValueKind::Bool,
            raw,
            "expected true/false, yes/no, on/off or 1/0",
        )),
    }
}

/// Split an integer literal into sign, radix and bare digits.
///
/// Underscores are accepted between digits and removed.
fn split_integer(raw: &str, kind: ValueKind) -> Result<(bool, u32, String), InvalidValue> {
    let s = raw.trim();
    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let lower = unsigned.get(..2).map(|p| p.to_ascii_lowercase());
    let (radix, digits) = match lower.as_deref() {
        Some("0x") => (16, &unsigned[2..]),
        Some("0o") => (8, &unsigned[2..]),
        Some("0b") => (2, &unsigned[2..]),
        _ if unsigned.len() > 1 && unsigned.starts_with('0') => (8, &unsigned[1..]),
        _ => (10, unsigned),
    };

    if digits.is_empty() {
        return Err(InvalidValue::new(kind, raw, "missing digits"));
    }
    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return Err(InvalidValue::new(kind, raw, "misplaced digit separator"));
    }
    // from_str_radix would accept a second sign
    if digits.starts_with(['+', '-']) {
        return Err(InvalidValue::new(kind, raw, "invalid digit"));
    }

    let digits = digits.replace('_', "");
    // "-0" is zero, not a negative number
    let negative = negative && digits.bytes().any(|b| b != b'0');
    Ok((negative, radix, digits))
}

fn int_error(kind: ValueKind, raw: &str, err: &std::num::ParseIntError) -> InvalidValue {
    use std::num::IntErrorKind;
    let reason = match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => "out of range",
        IntErrorKind::Empty => "missing digits",
        _ => "invalid digit",
    };
    InvalidValue::new(kind, raw, reason)
}

macro_rules! impl_from_setting_int {
    ($kind:expr => $($t:ty),+) => {
        $(
            impl FromSetting for $t {
                const KIND: ValueKind = $kind;

                fn from_setting(raw: &str) -> Result<Self, InvalidValue> {
                    let (negative, radix, digits) = split_integer(raw, Self::KIND)?;
                    if negative && <$t>::MIN == 0 {
                        return Err(InvalidValue::new(
                            Self::KIND,
                            raw,
                            "negative value for unsigned",
                        ));
                    }
                    let literal = if negative { format!("-{}", digits) } else { digits };
                    <$t>::from_str_radix(&literal, radix)
                        .map_err(|e| int_error(Self::KIND, raw, &e))
                }
            }
        )+
    };
}

impl_from_setting_int!(ValueKind::Int => i8, i16, i32, i64, isize);
impl_from_setting_int!(ValueKind::Uint => u8, u16, u32, u64, usize);

impl FromSetting for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_setting(raw: &str) -> Result<Self, InvalidValue> {
        raw.trim()
            .parse::<f64>()
            .map_err(|_| InvalidValue::new(Self::KIND, raw, "not a number"))
    }
}

impl FromSetting for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_setting(raw: &str) -> Result<Self, InvalidValue> {
        raw.trim()
            .parse::<f32>()
            .map_err(|_| InvalidValue::new(Self::KIND, raw, "not a number"))
    }
}

impl FromSetting for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_setting(raw: &str) -> Result<Self, InvalidValue> {
        parse_bool(raw)
    }
}

impl FromSetting for String {
    const KIND: ValueKind = ValueKind::String;

    fn from_setting(raw: &str) -> Result<Self, InvalidValue> {
        Ok(raw.to_string())
    }
}

impl FromSetting for PathBuf {
    const KIND: ValueKind = ValueKind::Path;

    fn from_setting(raw: &str) -> Result<Self, InvalidValue> {
        Ok(PathBuf::from(raw))
    }
}

impl FromSetting for Duration {
    const KIND: ValueKind = ValueKind::Duration;

    fn from_setting(raw: &str) -> Result<Self, InvalidValue> {
        parse_duration(raw)
    }
}

impl<T: FromSetting> FromSetting for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn from_setting(raw: &str) -> Result<Self, InvalidValue> {
        T::from_setting(raw).map(Some)
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits beyond this are dropped; they are below nanosecond precision.
const MAX_FRACTION_DIGITS: usize = 20;

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Parse a duration such as `1h`, `30m`, `1.5s` or `2h45m10s`.
pub fn parse_duration(raw: &str) -> Result<Duration, InvalidValue> {
    let err = |reason| InvalidValue::new(ValueKind::Duration, raw, reason);

    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    } else if s.starts_with('-') {
        return Err(err("negative durations are not supported"));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(err("empty duration"));
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let int_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (int_part, rest) = s.split_at(int_end);

        let (frac_part, rest) = match rest.strip_prefix('.') {
            Some(after_dot) => {
                let frac_end = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                after_dot.split_at(frac_end)
            }
            None => ("", rest),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err("expected a number"));
        }

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let (unit, rest) = rest.split_at(unit_end);
        if unit.is_empty() {
            return Err(err("missing unit"));
        }
        let scale = unit_nanos(unit).ok_or_else(|| err("unknown unit"))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| err("out of range"))?
        };
        let mut amount = whole.checked_mul(scale).ok_or_else(|| err("out of range"))?;

        let frac_digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
        if !frac_digits.is_empty() {
            let numerator: u128 = frac_digits.parse().map_err(|_| err("out of range"))?;
            let denominator = 10u128.pow(frac_digits.len() as u32);
            amount += numerator * scale / denominator;
        }

        total = total.checked_add(amount).ok_or_else(|| err("out of range"))?;
        s = rest;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| err("out of range"))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}
