//! Record metadata and generic tables
//!
//! A record type describes its columns once ([`TableRecord::columns`]) and
//! exposes its fields by ordinal. Import goes through [`FromTableRow`], a
//! list of named setters matched case-insensitively against the header row.
//! The [`table_record!`](crate::table_record) macro implements both traits
//! for a plain struct.
//!
//! [`DataTable`] and [`ImportedTable`] cover the untyped case: rows of
//! [`Value`]s to export, rows of [`DecodedValue`]s read back.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

use crate::batch::RowSource;
use crate::types::{Column, DecodedValue, TypeTag, Value};

/// Maps a Rust field type to its declared column type
pub trait ColumnType {
    const TYPE_TAG: TypeTag;
}

macro_rules! column_type {
    ($tag:ident: $($ty:ty),+) => {
        $(
            impl ColumnType for $ty {
                const TYPE_TAG: TypeTag = TypeTag::$tag;
            }
        )+
    };
}

column_type!(Integer: i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
column_type!(Decimal: f32, f64);
column_type!(Boolean: bool);
column_type!(String: String, &str);
column_type!(DateTime: NaiveDate, NaiveDateTime);
column_type!(Unknown: Value);

impl<T: ColumnType> ColumnType for Option<T> {
    const TYPE_TAG: TypeTag = T::TYPE_TAG;
}

/// Build a column whose declared type comes from `T`
pub fn column_of<T: ColumnType>(name: &str, ordinal: usize) -> Column {
    Column::new(name, T::TYPE_TAG, ordinal)
}

/// A record type that can be exported row by row
pub trait TableRecord {
    /// Columns in export order, ordinals starting at 0
    fn columns() -> Vec<Column>;

    /// Value of the field at `ordinal`
    fn value(&self, ordinal: usize) -> Value;
}

/// Conversion from a decoded cell into a field type
///
/// `None` means the cell could not be converted; the field keeps its default.
pub trait FromDecoded: Sized {
    fn from_decoded(value: &DecodedValue) -> Option<Self>;
}

macro_rules! from_decoded_int {
    ($via:ident: $($ty:ty),+) => {
        $(
            impl FromDecoded for $ty {
                fn from_decoded(value: &DecodedValue) -> Option<Self> {
                    value.$via().and_then(|v| <$ty>::try_from(v).ok())
                }
            }
        )+
    };
}

from_decoded_int!(as_i64: i8, i16, i32, i64, isize);
from_decoded_int!(as_u64: u8, u16, u32, u64, usize);

impl FromDecoded for f64 {
    fn from_decoded(value: &DecodedValue) -> Option<Self> {
        value.as_f64()
    }
}

impl FromDecoded for f32 {
    fn from_decoded(value: &DecodedValue) -> Option<Self> {
        value.as_f64().map(|v| v as f32)
    }
}

impl FromDecoded for bool {
    fn from_decoded(value: &DecodedValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromDecoded for String {
    fn from_decoded(value: &DecodedValue) -> Option<Self> {
        value.as_text()
    }
}

impl FromDecoded for NaiveDateTime {
    fn from_decoded(value: &DecodedValue) -> Option<Self> {
        value.as_datetime()
    }
}

impl FromDecoded for NaiveDate {
    fn from_decoded(value: &DecodedValue) -> Option<Self> {
        value.as_datetime().map(|dt| dt.date())
    }
}

impl FromDecoded for DecodedValue {
    fn from_decoded(value: &DecodedValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl<T: FromDecoded> FromDecoded for Option<T> {
    fn from_decoded(value: &DecodedValue) -> Option<Self> {
        T::from_decoded(value).map(Some)
    }
}

/// Named field setter used by the importer
///
/// `set` returns `true` when the value was converted and stored.
pub struct FieldSetter<T> {
    pub name: &'static str,
    pub set: fn(&mut T, &DecodedValue) -> bool,
}

impl<T> FieldSetter<T> {
    /// Create a new setter
    pub fn new(name: &'static str, set: fn(&mut T, &DecodedValue) -> bool) -> Self {
        FieldSetter { name, set }
    }
}

impl<T> Clone for FieldSetter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldSetter<T> {}

/// A record type that can be built from an imported row
pub trait FromTableRow: Default {
    /// Setters for every importable field
    fn setters() -> Vec<FieldSetter<Self>>;
}

/// Implement [`TableRecord`] and [`FromTableRow`] for a struct
///
/// Each field is listed with its type and its column name, in column order.
///
/// ```
/// use chrono::NaiveDate;
/// use sheetbind::record::TableRecord;
/// use sheetbind::types::TypeTag;
///
/// #[derive(Debug, Default, Clone)]
/// struct Employee {
///     id: i64,
///     name: Option<String>,
///     hired: Option<NaiveDate>,
/// }
///
/// sheetbind::table_record!(Employee {
///     id: i64 => "Id",
///     name: Option<String> => "Name",
///     hired: Option<NaiveDate> => "Hired",
/// });
///
/// let columns = Employee::columns();
/// assert_eq!(columns[2].name, "Hired");
/// assert_eq!(columns[2].declared_type, TypeTag::DateTime);
/// ```
#[macro_export]
macro_rules! table_record {
    ($record:ty { $($field:ident : $ty:ty => $name:literal),+ $(,)? }) => {
        impl $crate::record::TableRecord for $record {
            fn columns() -> Vec<$crate::types::Column> {
                let mut columns = Vec::new();
                $(
                    let ordinal = columns.len();
                    columns.push($crate::record::column_of::<$ty>($name, ordinal));
                )+
                columns
            }

            fn value(&self, ordinal: usize) -> $crate::types::Value {
                let fields: &[fn(&Self) -> $crate::types::Value] = &[
                    $(|record: &Self| $crate::types::Value::from(record.$field.clone())),+
                ];
                fields
                    .get(ordinal)
                    .map_or($crate::types::Value::Null, |field| field(self))
            }
        }

        impl $crate::record::FromTableRow for $record {
            fn setters() -> Vec<$crate::record::FieldSetter<Self>> {
                vec![
                    $(
                        $crate::record::FieldSetter::new($name, |record: &mut Self, value: &$crate::types::DecodedValue| {
                            match <$ty as $crate::record::FromDecoded>::from_decoded(value) {
                                Some(v) => {
                                    record.$field = v;
                                    true
                                }
                                None => false,
                            }
                        })
                    ),+
                ]
            }
        }
    };
}

/// Lowercased name to ordinal; first column wins on duplicates
fn name_index(columns: &[Column]) -> IndexMap<String, usize> {
    let mut index = IndexMap::with_capacity(columns.len());
    for column in columns {
        index
            .entry(column.name.to_lowercase())
            .or_insert(column.ordinal);
    }
    index
}

/// A generic table of values to export
///
/// # Examples
///
/// ```
/// use sheetbind::record::DataTable;
/// use sheetbind::types::{TypeTag, Value};
///
/// let mut table = DataTable::new();
/// table.add_column("Id", TypeTag::Integer);
/// table.add_column("Name", TypeTag::String);
/// table.push_row(vec![Value::from(1), Value::from("Alice")]);
///
/// assert_eq!(table.column_index("name"), Some(1));
/// assert_eq!(table.value(0, "NAME"), Some(&Value::from("Alice")));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<Column>,
    index: IndexMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl DataTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given columns
    ///
    /// Ordinals are renumbered to the column positions, since rows are stored
    /// densely in column order.
    pub fn with_columns(mut columns: Vec<Column>) -> Self {
        for (position, column) in columns.iter_mut().enumerate() {
            column.ordinal = position;
        }
        let index = name_index(&columns);
        DataTable {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Append a column and return its ordinal
    ///
    /// Existing rows get a null in the new column.
    pub fn add_column(&mut self, name: &str, declared_type: TypeTag) -> usize {
        let ordinal = self.columns.len();
        self.columns.push(Column::new(name, declared_type, ordinal));
        self.index.entry(name.to_lowercase()).or_insert(ordinal);
        for row in &mut self.rows {
            row.push(Value::Null);
        }
        ordinal
    }

    /// Append a row, padded with nulls or truncated to the column count
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Columns in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rows in order
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ordinal of a column by name (case-insensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_lowercase()).copied()
    }

    /// Value of a named column on a row
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let ordinal = self.column_index(column)?;
        self.rows.get(row)?.get(ordinal)
    }
}

impl RowSource for DataTable {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn value(&self, row: usize, column: &Column) -> Value {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column.ordinal))
            .cloned()
            .unwrap_or_default()
    }
}

/// A table read back from a sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedTable {
    columns: Vec<Column>,
    index: IndexMap<String, usize>,
    rows: Vec<Vec<DecodedValue>>,
}

impl ImportedTable {
    /// Create a table with the given columns and no rows
    pub fn new(columns: Vec<Column>) -> Self {
        let index = name_index(&columns);
        ImportedTable {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    pub(crate) fn push_row(&mut self, row: Vec<DecodedValue>) {
        self.rows.push(row);
    }

    /// Columns in sheet order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in sheet order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Rows in sheet order
    pub fn rows(&self) -> &[Vec<DecodedValue>] {
        &self.rows
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ordinal of a column by name (case-insensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_lowercase()).copied()
    }

    /// Decoded value of a named column on a row
    pub fn get(&self, row: usize, column: &str) -> Option<&DecodedValue> {
        let ordinal = self.column_index(column)?;
        self.rows.get(row)?.get(ordinal)
    }

    /// Convert into a [`DataTable`] with the given declared types
    ///
    /// Columns not listed in `types` keep [`TypeTag::Unknown`].
    pub fn into_data_table(self, types: &[(&str, TypeTag)]) -> DataTable {
        let columns = self
            .columns
            .into_iter()
            .map(|mut column| {
                if let Some((_, tag)) = types
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(&column.name))
                {
                    column.declared_type = *tag;
                }
                column
            })
            .collect();

        let mut table = DataTable::with_columns(columns);
        for row in self.rows {
            table.push_row(row.into_iter().map(Value::from).collect());
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Order {
        id: u32,
        amount: f64,
        paid: bool,
        note: Option<String>,
    }

    crate::table_record!(Order {
        id: u32 => "Id",
        amount: f64 => "Amount",
        paid: bool => "Paid",
        note: Option<String> => "Note",
    });

    #[test]
    fn test_record_columns() {
        let columns = Order::columns();
        let tags: Vec<_> = columns.iter().map(|c| c.declared_type).collect();
        assert_eq!(
            tags,
            vec![
                TypeTag::Integer,
                TypeTag::Decimal,
                TypeTag::Boolean,
                TypeTag::String
            ]
        );
        assert_eq!(columns[3].ordinal, 3);
    }

    #[test]
    fn test_record_values() {
        let order = Order {
            id: 7,
            amount: 12.5,
            paid: true,
            note: None,
        };
        assert_eq!(order.value(0), Value::UInt(7));
        assert_eq!(order.value(1), Value::Float(12.5));
        assert_eq!(order.value(3), Value::Null);
        assert_eq!(order.value(9), Value::Null);
    }

    #[test]
    fn test_setters_convert_or_leave_default() {
        let setters = Order::setters();
        let mut order = Order::default();

        assert!((setters[0].set)(&mut order, &DecodedValue::Number(42.0)));
        assert!(!(setters[1].set)(&mut order, &DecodedValue::Text("abc".into())));
        assert!((setters[2].set)(&mut order, &DecodedValue::Text("yes".into())));
        assert!((setters[3].set)(&mut order, &DecodedValue::Text("rush".into())));

        assert_eq!(
            order,
            Order {
                id: 42,
                amount: 0.0,
                paid: true,
                note: Some("rush".to_string()),
            }
        );
    }

    #[test]
    fn test_out_of_range_integer_not_set() {
        let setters = Order::setters();
        let mut order = Order::default();
        assert!(!(setters[0].set)(&mut order, &DecodedValue::Number(-1.0)));
        assert_eq!(order.id, 0);
    }

    #[test]
    fn test_data_table_pads_rows() {
        let mut table = DataTable::new();
        table.add_column("A", TypeTag::Integer);
        table.add_column("B", TypeTag::String);
        table.push_row(vec![Value::from(1)]);
        table.push_row(vec![Value::from(2), Value::from("x"), Value::from("extra")]);

        assert_eq!(table.rows()[0], vec![Value::Int(1), Value::Null]);
        assert_eq!(table.rows()[1].len(), 2);

        table.add_column("C", TypeTag::Boolean);
        assert_eq!(table.rows()[1][2], Value::Null);
    }

    #[test]
    fn test_with_columns_renumbers_ordinals() {
        let mut table = DataTable::with_columns(vec![
            Column::new("Id", TypeTag::Integer, 0),
            Column::new("Name", TypeTag::String, 2),
        ]);
        table.push_row(vec![Value::from(1), Value::from("Ann")]);

        let ordinals: Vec<_> = table.columns().iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1]);
        assert_eq!(table.value(0, "Name"), Some(&Value::from("Ann")));
        assert_eq!(
            RowSource::value(&table, 0, &table.columns()[1]),
            Value::from("Ann")
        );
    }

    #[test]
    fn test_imported_table_lookup() {
        let mut table = ImportedTable::new(vec![
            Column::new("Name", TypeTag::Unknown, 0),
            Column::new("Name_dup1", TypeTag::Unknown, 1),
        ]);
        table.push_row(vec![
            DecodedValue::Text("a".into()),
            DecodedValue::Number(3.0),
        ]);

        assert_eq!(table.get(0, "name_DUP1"), Some(&DecodedValue::Number(3.0)));
        let data = table.into_data_table(&[("Name_dup1", TypeTag::Integer)]);
        assert_eq!(data.columns()[1].declared_type, TypeTag::Integer);
        assert_eq!(data.value(0, "Name"), Some(&Value::from("a")));
    }
}
