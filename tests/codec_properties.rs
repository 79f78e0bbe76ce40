//! Property tests for the cell codec and width tracking

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use sheetbind::codec::{decode, encode, CellContent, EncodedCell, MAX_SAFE_INT};
use sheetbind::types::{FormatKind, RawCellValue};
use sheetbind::width::ColumnWidthTracker;
use sheetbind::{DecodedValue, TypeTag, Value};

/// What a reader sees for an encoded cell
fn as_raw(cell: EncodedCell) -> RawCellValue {
    match cell.content {
        CellContent::Text(s) => RawCellValue::Text(s),
        CellContent::Boolean(b) => RawCellValue::Boolean(b),
        CellContent::Number(value) => RawCellValue::Number {
            value,
            date_formatted: cell.kind == FormatKind::DateTimeValue,
        },
    }
}

fn round_trip(value: Value, declared_type: TypeTag) -> DecodedValue {
    decode(as_raw(encode(&value, declared_type)))
}

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

proptest! {
    #[test]
    fn integers_in_safe_range_survive(i in -MAX_SAFE_INT..=MAX_SAFE_INT) {
        let decoded = round_trip(Value::Int(i), TypeTag::Integer);
        prop_assert_eq!(decoded.as_i64(), Some(i));
    }

    #[test]
    fn integers_beyond_safe_range_survive_as_text(i in (MAX_SAFE_INT + 1)..i64::MAX) {
        let decoded = round_trip(Value::Int(i), TypeTag::Integer);
        prop_assert_eq!(&decoded, &DecodedValue::Text(i.to_string()));
        prop_assert_eq!(decoded.as_i64(), Some(i));
    }

    #[test]
    fn finite_decimals_survive(f in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        prop_assert_eq!(round_trip(Value::Float(f), TypeTag::Decimal), DecodedValue::Number(f));
    }

    #[test]
    fn booleans_survive(b in any::<bool>()) {
        prop_assert_eq!(round_trip(Value::Bool(b), TypeTag::Boolean), DecodedValue::Boolean(b));
    }

    #[test]
    fn text_survives(s in "\\PC*") {
        prop_assert_eq!(
            round_trip(Value::Text(s.clone()), TypeTag::String),
            DecodedValue::Text(s)
        );
    }

    #[test]
    fn datetimes_survive_to_the_millisecond(days in 1i64..2_958_465, millis in 0i64..86_400_000) {
        let dt = epoch() + Duration::days(days) + Duration::milliseconds(millis);
        prop_assert_eq!(
            round_trip(Value::DateTime(dt), TypeTag::DateTime),
            DecodedValue::DateTime(dt)
        );
    }

    #[test]
    fn width_does_not_depend_on_observation_order(
        lengths in proptest::collection::vec((0usize..4, 0usize..300), 1..64)
            .prop_shuffle()
    ) {
        let forward = ColumnWidthTracker::new(4);
        let backward = ColumnWidthTracker::new(4);
        for &(column, len) in &lengths {
            forward.observe(column, len);
        }
        for &(column, len) in lengths.iter().rev() {
            backward.observe(column, len);
        }

        let mut expected = [0usize; 4];
        for &(column, len) in &lengths {
            expected[column] = expected[column].max(len);
        }
        for (column, &width) in expected.iter().enumerate() {
            prop_assert_eq!(forward.width(column), width);
            prop_assert_eq!(backward.width(column), width);
        }
        prop_assert_eq!(forward.finalize(2, 255), backward.finalize(2, 255));
    }
}

#[test]
fn null_is_empty_text_not_missing() {
    for declared_type in [
        TypeTag::Integer,
        TypeTag::Decimal,
        TypeTag::Boolean,
        TypeTag::DateTime,
        TypeTag::String,
    ] {
        assert_eq!(
            round_trip(Value::Null, declared_type),
            DecodedValue::Text(String::new())
        );
    }
    assert_eq!(decode(RawCellValue::Empty), DecodedValue::Missing);
}
