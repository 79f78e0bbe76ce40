//! `.xlsx` package serialization
//!
//! Turns an in-memory [`Workbook`](crate::document::Workbook) into the zip
//! package spreadsheet applications open:
//! - XML generated directly into a reusable buffer
//! - one shared strings table for the whole workbook
//! - styles written from the workbook's style table
//!
//! Use [`crate::writer::ExcelWriter`] for the file-level API.

pub mod shared_strings;
pub mod styles;
pub mod workbook;
pub mod worksheet;
pub mod xml_writer;

pub use shared_strings::SharedStrings;
pub use workbook::{write_package, DEFAULT_COMPRESSION_LEVEL};
pub use xml_writer::XmlWriter;
