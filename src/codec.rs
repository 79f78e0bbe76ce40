//! Cell value codec
//!
//! Pure mapping between native values and cell contents. Encoding never fails:
//! a value that cannot be stored under its declared type is written as plain
//! text instead. Decoding never fails either: anything unreadable becomes
//! [`DecodedValue::Missing`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::types::{DecodedValue, FormatKind, RawCellValue, TypeTag, Value};

/// Largest serial a worksheet can show as a date (9999-12-31)
pub const MAX_DATE_SERIAL: f64 = 2_958_465.0;

/// Integers beyond this magnitude lose precision in a number cell (2^53)
pub const MAX_SAFE_INT: i64 = 1 << 53;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

const DATETIME_PATTERNS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_PATTERNS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Content of an encoded cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    /// Text cell
    Text(String),
    /// Number cell; dates are day-count serials
    Number(f64),
    /// Boolean cell
    Boolean(bool),
}

/// Result of encoding one value
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedCell {
    /// What goes into the cell
    pub content: CellContent,
    /// Which style the cell gets
    pub kind: FormatKind,
}

impl EncodedCell {
    /// Plain text cell
    pub fn text(s: impl Into<String>) -> Self {
        EncodedCell {
            content: CellContent::Text(s.into()),
            kind: FormatKind::PlainText,
        }
    }

    /// Empty text cell, used for nulls and unconvertible dates
    pub fn empty() -> Self {
        Self::text(String::new())
    }

    fn number(value: f64, kind: FormatKind) -> Self {
        EncodedCell {
            content: CellContent::Number(value),
            kind,
        }
    }

    /// Byte length of the text this cell displays
    ///
    /// A date cell displays as wide as its format code (`yyyy-mm-dd` shows
    /// ten characters).
    pub fn rendered_len(&self, date_format: &str) -> usize {
        match (&self.content, self.kind) {
            (CellContent::Text(s), _) => s.len(),
            (CellContent::Boolean(true), _) => 4,
            (CellContent::Boolean(false), _) => 5,
            (CellContent::Number(_), FormatKind::DateTimeValue) => date_format.len(),
            (CellContent::Number(n), FormatKind::IntegerNumber) => {
                itoa::Buffer::new().format(*n as i64).len()
            }
            (CellContent::Number(n), _) => n.to_string().len(),
        }
    }
}

/// Encode a native value under its column's declared type
///
/// # Examples
///
/// ```
/// use sheetbind::codec::{encode, CellContent};
/// use sheetbind::types::{FormatKind, TypeTag, Value};
///
/// let cell = encode(&Value::Int(42), TypeTag::Integer);
/// assert_eq!(cell.content, CellContent::Number(42.0));
/// assert_eq!(cell.kind, FormatKind::IntegerNumber);
///
/// // Not an integer: written as text rather than failing
/// let cell = encode(&Value::from("n/a"), TypeTag::Integer);
/// assert_eq!(cell.kind, FormatKind::PlainText);
/// ```
pub fn encode(value: &Value, declared_type: TypeTag) -> EncodedCell {
    if value.is_null() {
        return EncodedCell::empty();
    }

    match declared_type {
        TypeTag::DateTime => encode_datetime(value),
        TypeTag::Boolean => EncodedCell {
            content: CellContent::Boolean(coerce_bool(value)),
            kind: FormatKind::PlainText,
        },
        TypeTag::Integer => encode_integer(value),
        TypeTag::Decimal => encode_decimal(value),
        TypeTag::String | TypeTag::Unknown => EncodedCell::text(value.to_string()),
    }
}

fn encode_datetime(value: &Value) -> EncodedCell {
    let serial = match value {
        Value::DateTime(dt) => Some(datetime_to_serial(*dt)),
        Value::Date(d) => d.and_hms_opt(0, 0, 0).map(datetime_to_serial),
        Value::Text(s) => parse_datetime_str(s).map(datetime_to_serial).or_else(|| {
            s.trim()
                .parse::<f64>()
                .ok()
                .filter(|serial| serial_to_datetime(*serial).is_some())
        }),
        Value::Int(i) => Some(*i as f64),
        Value::UInt(u) => Some(*u as f64),
        Value::Float(f) => Some(*f),
        Value::Bool(_) | Value::Null => None,
    };

    match serial.filter(|s| (0.0..MAX_DATE_SERIAL + 1.0).contains(s)) {
        Some(serial) => EncodedCell::number(serial, FormatKind::DateTimeValue),
        // a real date outside the serial range keeps its text form
        None if matches!(value, Value::Date(_) | Value::DateTime(_)) => {
            log::debug!("date {} outside the serial range, written as text", value);
            EncodedCell::text(value.to_string())
        }
        None => EncodedCell::empty(),
    }
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Text(s) => parse_bool(s).unwrap_or(false),
        Value::Int(i) => *i != 0,
        Value::UInt(u) => *u != 0,
        Value::Float(f) => *f != 0.0,
        Value::Date(_) | Value::DateTime(_) | Value::Null => false,
    }
}

fn encode_integer(value: &Value) -> EncodedCell {
    let widened = match value {
        Value::Int(i) => Some(*i),
        Value::UInt(u) => i64::try_from(*u).ok(),
        Value::Float(f) => f64_to_i64_exact(*f),
        Value::Text(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match widened {
        Some(i) if i.unsigned_abs() <= MAX_SAFE_INT as u64 => {
            EncodedCell::number(i as f64, FormatKind::IntegerNumber)
        }
        _ => {
            log::debug!("integer value {} written as text", value);
            EncodedCell::text(value.to_string())
        }
    }
}

fn encode_decimal(value: &Value) -> EncodedCell {
    let widened = match value {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f64),
        Value::UInt(u) => Some(*u as f64),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match widened {
        Some(f) if f.is_finite() => EncodedCell::number(f, FormatKind::DecimalNumber),
        Some(f) if f.is_nan() => EncodedCell::text("NaN"),
        Some(f) if f > 0.0 => EncodedCell::text("Inf"),
        Some(_) => EncodedCell::text("-Inf"),
        None => EncodedCell::text(value.to_string()),
    }
}

/// Decode a raw cell into a native value
///
/// Formula cells decode through their cached result; error cells decode to
/// their error text.
///
/// # Examples
///
/// ```
/// use sheetbind::codec::decode;
/// use sheetbind::types::{DecodedValue, RawCellValue};
///
/// assert_eq!(decode(RawCellValue::Empty), DecodedValue::Missing);
/// assert_eq!(
///     decode(RawCellValue::Error("#DIV/0!".to_string())),
///     DecodedValue::Text("#DIV/0!".to_string())
/// );
/// ```
pub fn decode(raw: RawCellValue) -> DecodedValue {
    match raw {
        RawCellValue::Formula { cached } => match *cached {
            RawCellValue::Formula { .. } => DecodedValue::Missing,
            result => decode(result),
        },
        RawCellValue::Text(s) => DecodedValue::Text(s),
        RawCellValue::Number {
            value,
            date_formatted: true,
        } => serial_to_datetime(value)
            .map(DecodedValue::DateTime)
            .unwrap_or(DecodedValue::Number(value)),
        RawCellValue::Number { value, .. } => DecodedValue::Number(value),
        RawCellValue::Boolean(b) => DecodedValue::Boolean(b),
        RawCellValue::Error(e) => DecodedValue::Text(e),
        RawCellValue::Empty => DecodedValue::Missing,
    }
}

fn excel_epoch() -> Option<NaiveDateTime> {
    // December 30, 1899 absorbs the 1900 leap year bug
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

/// Convert a date-time to its day-count serial
pub fn datetime_to_serial(dt: NaiveDateTime) -> f64 {
    match excel_epoch() {
        Some(epoch) => (dt - epoch).num_milliseconds() as f64 / MILLIS_PER_DAY,
        None => 0.0,
    }
}

/// Convert a day-count serial to a date-time, to the millisecond
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..MAX_DATE_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    excel_epoch()?.checked_add_signed(Duration::milliseconds(millis))
}

/// Parse a date or date-time string in one of the accepted layouts
pub fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    for pattern in DATETIME_PATTERNS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Some(dt);
        }
    }
    for pattern in DATE_PATTERNS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, pattern) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parse a boolean spelled `true/false`, `yes/no` or `1/0`
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Convert an integral float to `i64` without loss
pub fn f64_to_i64_exact(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_null_is_empty_text_for_every_type() {
        for tag in [
            TypeTag::String,
            TypeTag::Integer,
            TypeTag::Decimal,
            TypeTag::Boolean,
            TypeTag::DateTime,
            TypeTag::Unknown,
        ] {
            assert_eq!(encode(&Value::Null, tag), EncodedCell::empty());
        }
    }

    #[test]
    fn test_serial_conversion() {
        assert_eq!(datetime_to_serial(ymd(2023, 1, 1)), 44927.0);
        assert_eq!(datetime_to_serial(ymd(2000, 1, 1)), 36526.0);
        assert_eq!(serial_to_datetime(44927.5), Some(ymd(2023, 1, 1) + Duration::hours(12)));
        assert_eq!(serial_to_datetime(-1.0), None);
        assert_eq!(serial_to_datetime(f64::NAN), None);
    }

    #[test]
    fn test_encode_datetime_sources() {
        let expected = EncodedCell::number(44927.0, FormatKind::DateTimeValue);
        assert_eq!(encode(&Value::DateTime(ymd(2023, 1, 1)), TypeTag::DateTime), expected);
        assert_eq!(
            encode(&Value::Date(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()), TypeTag::DateTime),
            expected
        );
        assert_eq!(encode(&Value::from("2023-01-01"), TypeTag::DateTime), expected);
        assert_eq!(encode(&Value::from("44927"), TypeTag::DateTime), expected);
        assert_eq!(encode(&Value::Float(44927.0), TypeTag::DateTime), expected);
        assert_eq!(encode(&Value::from("not a date"), TypeTag::DateTime), EncodedCell::empty());
        assert_eq!(encode(&Value::Float(-3.0), TypeTag::DateTime), EncodedCell::empty());
    }

    #[test]
    fn test_encode_out_of_range_date_keeps_text() {
        let early = NaiveDate::from_ymd_opt(1850, 6, 1).unwrap();
        assert_eq!(
            encode(&Value::Date(early), TypeTag::DateTime),
            EncodedCell::text("1850-06-01")
        );
        let before_epoch = NaiveDate::from_ymd_opt(1899, 12, 29)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        assert_eq!(
            encode(&Value::DateTime(before_epoch), TypeTag::DateTime),
            EncodedCell::text("1899-12-29 23:00:00")
        );
    }

    #[test]
    fn test_encode_boolean_defaults_to_false() {
        let cell = encode(&Value::from("maybe"), TypeTag::Boolean);
        assert_eq!(cell.content, CellContent::Boolean(false));
        let cell = encode(&Value::from("Yes"), TypeTag::Boolean);
        assert_eq!(cell.content, CellContent::Boolean(true));
    }

    #[test]
    fn test_encode_integer_fallbacks() {
        assert_eq!(
            encode(&Value::UInt(7), TypeTag::Integer),
            EncodedCell::number(7.0, FormatKind::IntegerNumber)
        );
        assert_eq!(
            encode(&Value::UInt(u64::MAX), TypeTag::Integer),
            EncodedCell::text(u64::MAX.to_string())
        );
        assert_eq!(
            encode(&Value::Int(MAX_SAFE_INT + 1), TypeTag::Integer),
            EncodedCell::text((MAX_SAFE_INT + 1).to_string())
        );
        assert_eq!(encode(&Value::Float(2.5), TypeTag::Integer), EncodedCell::text("2.5"));
        assert_eq!(
            encode(&Value::from(" 12 "), TypeTag::Integer),
            EncodedCell::number(12.0, FormatKind::IntegerNumber)
        );
    }

    #[test]
    fn test_encode_decimal_non_finite() {
        assert_eq!(encode(&Value::Float(f64::NAN), TypeTag::Decimal), EncodedCell::text("NaN"));
        assert_eq!(
            encode(&Value::Float(f64::NEG_INFINITY), TypeTag::Decimal),
            EncodedCell::text("-Inf")
        );
        assert_eq!(
            encode(&Value::Int(3), TypeTag::Decimal),
            EncodedCell::number(3.0, FormatKind::DecimalNumber)
        );
    }

    #[test]
    fn test_encode_unknown_uses_text_form() {
        assert_eq!(encode(&Value::Float(1.25), TypeTag::Unknown), EncodedCell::text("1.25"));
        assert_eq!(
            encode(&Value::DateTime(ymd(2023, 1, 1)), TypeTag::String),
            EncodedCell::text("2023-01-01 00:00:00")
        );
    }

    #[test]
    fn test_decode_number_and_date() {
        let plain = RawCellValue::Number {
            value: 44927.0,
            date_formatted: false,
        };
        assert_eq!(decode(plain), DecodedValue::Number(44927.0));

        let dated = RawCellValue::Number {
            value: 44927.0,
            date_formatted: true,
        };
        assert_eq!(decode(dated), DecodedValue::DateTime(ymd(2023, 1, 1)));
    }

    #[test]
    fn test_decode_formula_uses_cached_result() {
        let formula = RawCellValue::Formula {
            cached: Box::new(RawCellValue::Number {
                value: 44927.0,
                date_formatted: true,
            }),
        };
        assert_eq!(decode(formula), DecodedValue::DateTime(ymd(2023, 1, 1)));

        let failed = RawCellValue::Formula {
            cached: Box::new(RawCellValue::Error("#N/A".to_string())),
        };
        assert_eq!(decode(failed), DecodedValue::Text("#N/A".to_string()));
    }

    #[test]
    fn test_blank_and_empty_text_are_distinct() {
        assert_eq!(decode(RawCellValue::Empty), DecodedValue::Missing);
        assert_eq!(
            decode(RawCellValue::Text(String::new())),
            DecodedValue::Text(String::new())
        );
    }

    #[test]
    fn test_rendered_len() {
        assert_eq!(encode(&Value::Int(-1234), TypeTag::Integer).rendered_len("yyyy"), 5);
        assert_eq!(encode(&Value::Bool(false), TypeTag::Boolean).rendered_len("yyyy"), 5);
        assert_eq!(
            encode(&Value::DateTime(ymd(2023, 1, 1)), TypeTag::DateTime).rendered_len("yyyy-mm-dd"),
            10
        );
        assert_eq!(encode(&Value::from("héllo"), TypeTag::String).rendered_len(""), 6);
    }
}
