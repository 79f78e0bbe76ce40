//! Error types for sheetbind
//!
//! Only hard failures live here. A cell that cannot be converted is never an
//! error (see [`crate::codec`]), and "nothing to export / nothing imported" is
//! reported through [`crate::types::TableOutcome`].

use thiserror::Error;

/// Result type alias for sheetbind operations
pub type Result<T> = std::result::Result<T, ExcelError>;

/// Main error type for all Excel operations
#[derive(Error, Debug)]
pub enum ExcelError {
    /// Error occurred while reading Excel file
    #[error("Failed to read Excel file: {0}")]
    ReadError(String),

    /// Error occurred while writing Excel file
    #[error("Failed to write Excel file: {0}")]
    WriteError(String),

    /// Invalid sheet name or sheet not found
    #[error("Sheet '{sheet}' not found. Available sheets: {available}")]
    SheetNotFound { sheet: String, available: String },

    /// The data does not fit into a single worksheet
    #[error("{rows} rows exceed the worksheet limit of {limit}")]
    RowLimitExceeded { rows: usize, limit: usize },

    /// Too many columns for a single worksheet
    #[error("{columns} columns exceed the worksheet limit of {limit}")]
    ColumnLimitExceeded { columns: usize, limit: usize },

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Calamine error wrapper
    #[error("Calamine error: {0}")]
    CalamineError(String),
}

impl From<calamine::Error> for ExcelError {
    fn from(err: calamine::Error) -> Self {
        ExcelError::CalamineError(err.to_string())
    }
}

impl From<calamine::XlsxError> for ExcelError {
    fn from(err: calamine::XlsxError) -> Self {
        ExcelError::CalamineError(err.to_string())
    }
}

impl From<zip::result::ZipError> for ExcelError {
    fn from(err: zip::result::ZipError) -> Self {
        ExcelError::WriteError(err.to_string())
    }
}

impl From<tempfile::PersistError> for ExcelError {
    fn from(err: tempfile::PersistError) -> Self {
        ExcelError::IoError(err.error)
    }
}
