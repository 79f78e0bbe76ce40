//! Type definitions shared by the exporter, the importer and the codec

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

use crate::codec;

/// Declared type of a column, resolved once per export/import call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeTag {
    /// Text column
    String,
    /// Any integer width, signed or unsigned
    Integer,
    /// Floating point or fixed-point decimal
    Decimal,
    /// Boolean column
    Boolean,
    /// Date or date-time column
    DateTime,
    /// Anything else; written as text
    #[default]
    Unknown,
}

/// Presentation category of a cell
///
/// Drives both the number format of a cell and the [`crate::style::StyleCache`] key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// General text
    PlainText = 0,
    /// Bold, centered header cell
    Header = 1,
    /// Merged title above the header
    Title = 2,
    /// Whole number
    IntegerNumber = 3,
    /// Fractional number
    DecimalNumber = 4,
    /// Day-count serial shown as a date
    DateTimeValue = 5,
}

impl FormatKind {
    /// Number of format kinds
    pub const COUNT: usize = 6;

    /// All kinds, in index order
    pub const ALL: [FormatKind; FormatKind::COUNT] = [
        FormatKind::PlainText,
        FormatKind::Header,
        FormatKind::Title,
        FormatKind::IntegerNumber,
        FormatKind::DecimalNumber,
        FormatKind::DateTimeValue,
    ];

    /// Dense index used by the style cache
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// A column of an exported or imported table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Display name, written into the header row
    pub name: String,
    /// Declared type driving the codec
    pub declared_type: TypeTag,
    /// Zero-based position in the table
    pub ordinal: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, declared_type: TypeTag, ordinal: usize) -> Self {
        Column {
            name: name.into(),
            declared_type,
            ordinal,
        }
    }
}

/// Zero-based cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellSlot {
    /// Row index (0-based)
    pub row: u32,
    /// Column index (0-based)
    pub column: u32,
}

impl CellSlot {
    /// Create a new slot
    pub fn new(row: u32, column: u32) -> Self {
        CellSlot { row, column }
    }

    /// Get Excel-style cell reference (e.g., "A1", "B2")
    pub fn reference(&self) -> String {
        format!("{}{}", column_letter(self.column), self.row + 1)
    }
}

/// Convert column index to Excel letter (0 -> A, 25 -> Z, 26 -> AA)
pub fn column_letter(col: u32) -> String {
    let mut result = String::new();
    let mut col = col + 1;

    while col > 0 {
        col -= 1;
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        col /= 26;
    }

    result
}

/// A native value handed to the exporter
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null / missing value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Signed integer of any width
    Int(i64),
    /// Unsigned integer of any width
    UInt(u64),
    /// Floating point value
    Float(f64),
    /// Text value
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Date with time of day
    DateTime(NaiveDateTime),
}

impl Value {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Value::Int(i) => write!(f, "{}", i),
            Value::UInt(u) => write!(f, "{}", u),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

macro_rules! value_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Value {
                fn from(v: $source) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )+
    };
}

value_from!(Int as i64: i8, i16, i32, i64, isize);
value_from!(UInt as u64: u8, u16, u32, u64, usize);
value_from!(Float as f64: f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<DecodedValue> for Value {
    fn from(v: DecodedValue) -> Self {
        match v {
            DecodedValue::Missing => Value::Null,
            DecodedValue::Text(s) => Value::Text(s),
            DecodedValue::Number(n) => Value::Float(n),
            DecodedValue::Boolean(b) => Value::Bool(b),
            DecodedValue::DateTime(dt) => Value::DateTime(dt),
        }
    }
}

/// A cell as reported by the spreadsheet document, before decoding
#[derive(Debug, Clone, PartialEq)]
pub enum RawCellValue {
    /// Text cell
    Text(String),
    /// Numeric cell; `date_formatted` is set when its number format shows a date
    Number { value: f64, date_formatted: bool },
    /// Boolean cell
    Boolean(bool),
    /// Formula cell, carrying the cached result of its last evaluation
    Formula { cached: Box<RawCellValue> },
    /// Error cell, e.g. `#DIV/0!`
    Error(String),
    /// No cell, or a blank one
    Empty,
}

/// A native value produced by decoding a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DecodedValue {
    /// No cell present, or unreadable. Distinct from `Text("")`.
    #[default]
    Missing,
    /// Text, including the text of error cells
    Text(String),
    /// Plain number
    Number(f64),
    /// Boolean
    Boolean(bool),
    /// Date-formatted number
    DateTime(NaiveDateTime),
}

impl DecodedValue {
    /// Check for the missing sentinel
    pub fn is_missing(&self) -> bool {
        matches!(self, DecodedValue::Missing)
    }

    /// Text form, `None` only for the missing sentinel
    pub fn as_text(&self) -> Option<String> {
        match self {
            DecodedValue::Missing => None,
            DecodedValue::Text(s) => Some(s.clone()),
            DecodedValue::Number(n) => Some(n.to_string()),
            DecodedValue::Boolean(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            DecodedValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// Integer form; fractional numbers do not convert
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DecodedValue::Number(n) => codec::f64_to_i64_exact(*n),
            DecodedValue::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().and_then(codec::f64_to_i64_exact))
            }
            DecodedValue::Boolean(b) => Some(i64::from(*b)),
            DecodedValue::Missing | DecodedValue::DateTime(_) => None,
        }
    }

    /// Unsigned integer form
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            DecodedValue::Text(s) => s
                .trim()
                .parse::<u64>()
                .ok()
                .or_else(|| self.as_i64().and_then(|i| u64::try_from(i).ok())),
            _ => self.as_i64().and_then(|i| u64::try_from(i).ok()),
        }
    }

    /// Floating point form
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Number(n) => Some(*n),
            DecodedValue::Text(s) => s.trim().parse().ok(),
            DecodedValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            DecodedValue::Missing | DecodedValue::DateTime(_) => None,
        }
    }

    /// Boolean form
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Boolean(b) => Some(*b),
            DecodedValue::Number(n) => Some(*n != 0.0),
            DecodedValue::Text(s) => codec::parse_bool(s),
            DecodedValue::Missing | DecodedValue::DateTime(_) => None,
        }
    }

    /// Date-time form; numbers are read as day-count serials
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            DecodedValue::DateTime(dt) => Some(*dt),
            DecodedValue::Number(n) => codec::serial_to_datetime(*n),
            DecodedValue::Text(s) => codec::parse_datetime_str(s),
            DecodedValue::Missing | DecodedValue::Boolean(_) => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text().unwrap_or_default())
    }
}

/// Why an export or import produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The input collection had no rows
    NoRows,
    /// No readable columns were found
    NoColumns,
    /// The requested header row does not exist
    HeaderRowMissing,
    /// The sheet has no rows at all
    SheetEmpty,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EmptyReason::NoRows => "no rows to process",
            EmptyReason::NoColumns => "no readable columns",
            EmptyReason::HeaderRowMissing => "header row not found",
            EmptyReason::SheetEmpty => "sheet is empty",
        };
        f.write_str(text)
    }
}

/// Outcome of an export or import that may legitimately produce nothing
#[derive(Debug, Clone, PartialEq)]
pub enum TableOutcome<T> {
    /// Something was produced
    Produced(T),
    /// Nothing was produced, and why
    Empty(EmptyReason),
}

impl<T> TableOutcome<T> {
    /// Check whether something was produced
    pub fn is_produced(&self) -> bool {
        matches!(self, TableOutcome::Produced(_))
    }

    /// Borrow the produced value
    pub fn produced(&self) -> Option<&T> {
        match self {
            TableOutcome::Produced(v) => Some(v),
            TableOutcome::Empty(_) => None,
        }
    }

    /// Take the produced value
    pub fn into_produced(self) -> Option<T> {
        match self {
            TableOutcome::Produced(v) => Some(v),
            TableOutcome::Empty(_) => None,
        }
    }

    /// Reason for an empty outcome
    pub fn empty_reason(&self) -> Option<EmptyReason> {
        match self {
            TableOutcome::Produced(_) => None,
            TableOutcome::Empty(reason) => Some(*reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_reference() {
        assert_eq!(CellSlot::new(0, 0).reference(), "A1");
        assert_eq!(CellSlot::new(0, 25).reference(), "Z1");
        assert_eq!(CellSlot::new(9, 26).reference(), "AA10");
        assert_eq!(CellSlot::new(0, 16_383).reference(), "XFD1");
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(42u8), Value::UInt(42));
        assert_eq!(Value::from(-7i16), Value::Int(-7));
        assert_eq!(Value::from(1.5f32), Value::Float(1.5));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
        assert_eq!(Value::Bool(true).to_string(), "TRUE");
    }

    #[test]
    fn test_decoded_accessors() {
        assert_eq!(DecodedValue::Number(42.0).as_i64(), Some(42));
        assert_eq!(DecodedValue::Number(42.5).as_i64(), None);
        assert_eq!(DecodedValue::Text(" 17 ".to_string()).as_i64(), Some(17));
        assert_eq!(
            DecodedValue::Text("9007199254740993".to_string()).as_i64(),
            Some(9_007_199_254_740_993)
        );
        assert_eq!(DecodedValue::Text("yes".to_string()).as_bool(), Some(true));
        assert_eq!(DecodedValue::Missing.as_text(), None);
        assert_eq!(DecodedValue::Number(3.0).as_text().as_deref(), Some("3"));
    }

    #[test]
    fn test_outcome_accessors() {
        let produced: TableOutcome<u8> = TableOutcome::Produced(1);
        assert!(produced.is_produced());
        assert_eq!(produced.produced(), Some(&1));

        let empty: TableOutcome<u8> = TableOutcome::Empty(EmptyReason::NoRows);
        assert_eq!(empty.empty_reason(), Some(EmptyReason::NoRows));
        assert_eq!(empty.into_produced(), None);
    }
}
