//! # sheetbind
//!
//! Typed table import/export for spreadsheets.
//!
//! ## Features
//!
//! - **Typed Export**: Records and generic tables become typed cells (numbers, dates, booleans, text)
//! - **Typed Import**: Header-driven mapping back into records, with case-insensitive field matching
//! - **Never Fails Per Cell**: Unconvertible values fall back to text on export and to a "missing" sentinel on import
//! - **Style Reuse**: One cell format per presentation kind per document
//! - **Auto-fit Columns**: Widths sized from the widest rendered value
//! - **Parallel Materialization**: Large exports encode values on a rayon pool, rows stay in order
//! - **Multiple Formats**: Reads XLSX, XLS, ODS; writes XLSX
//!
//! ## Quick Start
//!
//! ### Exporting records
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use sheetbind::{ExcelWriter, TableExporter};
//!
//! #[derive(Debug, Default, Clone)]
//! struct Employee {
//!     id: i64,
//!     name: Option<String>,
//!     hired: Option<NaiveDate>,
//! }
//!
//! sheetbind::table_record!(Employee {
//!     id: i64 => "Id",
//!     name: Option<String> => "Name",
//!     hired: Option<NaiveDate> => "Hired",
//! });
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let staff = vec![Employee {
//!     id: 1,
//!     name: Some("Alice".to_string()),
//!     hired: NaiveDate::from_ymd_opt(2023, 1, 1),
//! }];
//!
//! if let Some(workbook) = TableExporter::default()
//!     .export_records(&staff, "Staff", Some("Employees"))?
//!     .into_produced()
//! {
//!     ExcelWriter::new().save(&workbook, "staff.xlsx")?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Importing records
//!
//! ```rust,no_run
//! # use chrono::NaiveDate;
//! # #[derive(Debug, Default, Clone)]
//! # struct Employee { id: i64, name: Option<String>, hired: Option<NaiveDate> }
//! # sheetbind::table_record!(Employee {
//! #     id: i64 => "Id",
//! #     name: Option<String> => "Name",
//! #     hired: Option<NaiveDate> => "Hired",
//! # });
//! use sheetbind::config::ImportOptions;
//! use sheetbind::{ExcelReader, TableImporter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let workbook = ExcelReader::load("staff.xlsx")?;
//! let importer = TableImporter::new(ImportOptions::default().with_header_row(1));
//! let staff: Vec<Employee> = importer
//!     .import_sheet_records(&workbook, "Staff")?
//!     .into_produced()
//!     .unwrap_or_default();
//! println!("{} employees", staff.len());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod fast_writer;
pub mod import;
pub mod reader;
pub mod record;
pub mod style;
pub mod types;
pub mod width;
pub mod writer;

pub use config::{ExportOptions, ImportOptions};
pub use document::{SheetView, Workbook};
pub use error::{ExcelError, Result};
pub use export::{ExportSummary, TableExporter};
pub use import::TableImporter;
pub use reader::ExcelReader;
pub use record::{DataTable, FromTableRow, ImportedTable, TableRecord};
pub use types::{Column, DecodedValue, EmptyReason, TableOutcome, TypeTag, Value};
pub use writer::ExcelWriter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_reexports() {
        let mut table = DataTable::new();
        table.add_column("Id", TypeTag::Integer);
        table.add_column("Name", TypeTag::String);
        table.push_row(vec![Value::from(7), Value::from("Ann")]);

        let workbook = TableExporter::new(ExportOptions::default())
            .export_table(&table, "People", None)
            .unwrap()
            .into_produced()
            .unwrap();
        let bytes = ExcelWriter::new().to_bytes(&workbook).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let view: SheetView<'_> = workbook.view_by_name("People").unwrap();
        let outcome: TableOutcome<ImportedTable> =
            TableImporter::new(ImportOptions::default()).import_table(view);
        let imported = outcome.into_produced().unwrap();
        assert_eq!(imported.get(0, "id"), Some(&DecodedValue::Number(7.0)));
        assert_eq!(
            imported.get(0, "NAME"),
            Some(&DecodedValue::Text("Ann".to_string()))
        );

        let empty = TableExporter::default()
            .export_table(&DataTable::new(), "Nothing", None)
            .unwrap();
        assert_eq!(empty.empty_reason(), Some(EmptyReason::NoRows));

        let missing: Result<Workbook> = ExcelReader::load("does-not-exist.xlsx");
        assert!(matches!(missing, Err(ExcelError::ReadError(_))));
    }
}
