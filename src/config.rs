//! Export and import options

/// Excel worksheet maximum row count
pub const MAX_ROWS: usize = 1_048_576;
/// Excel worksheet maximum column count
pub const MAX_COLUMNS: usize = 16_384;
/// Excel maximum column width, in characters
pub const MAX_COLUMN_WIDTH: usize = 255;
/// Excel sheet name maximum length
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Options consumed by [`crate::export::TableExporter`]
///
/// None of these change how the codec maps types; they only affect the row
/// writer, the style formats and column sizing.
///
/// # Examples
///
/// ```
/// use sheetbind::config::ExportOptions;
///
/// let options = ExportOptions::default()
///     .with_parallel_processing_threshold(5_000)
///     .with_batch_size(500);
/// assert_eq!(options.batch_size, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExportOptions {
    /// Number format code of date cells
    pub default_date_format: String,
    /// Number format code of integer cells
    pub integer_format: String,
    /// Number format code of decimal cells
    pub decimal_format: String,
    /// Size columns from the widest rendered value
    pub auto_fit_columns: bool,
    /// Row count above which values are materialized in parallel
    pub parallel_processing_threshold: usize,
    /// Write rows in `batch_size` chunks instead of one pass
    pub use_batch_write: bool,
    /// Rows per batch
    pub batch_size: usize,
    /// Upper bound on worker threads; `None` uses the global pool
    pub max_parallelism: Option<usize>,
    /// Characters added to every fitted column
    pub column_width_padding: usize,
    /// Fitted widths never exceed this
    pub max_column_width: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            default_date_format: "yyyy-mm-dd hh:mm:ss".to_string(),
            integer_format: "0".to_string(),
            decimal_format: "0.00".to_string(),
            auto_fit_columns: true,
            parallel_processing_threshold: 10_000,
            use_batch_write: true,
            batch_size: 1_000,
            max_parallelism: None,
            column_width_padding: 2,
            max_column_width: MAX_COLUMN_WIDTH,
        }
    }
}

impl ExportOptions {
    /// Set the date number format
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.default_date_format = format.to_string();
        self
    }

    /// Enable or disable column auto-fit
    pub fn with_auto_fit_columns(mut self, enabled: bool) -> Self {
        self.auto_fit_columns = enabled;
        self
    }

    /// Set the parallel materialization threshold
    pub fn with_parallel_processing_threshold(mut self, threshold: usize) -> Self {
        self.parallel_processing_threshold = threshold;
        self
    }

    /// Enable or disable batched writing
    pub fn with_batch_write(mut self, enabled: bool) -> Self {
        self.use_batch_write = enabled;
        self
    }

    /// Set rows per batch
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Bound the number of worker threads
    pub fn with_max_parallelism(mut self, threads: usize) -> Self {
        self.max_parallelism = Some(threads);
        self
    }

    /// Rows written per pass for a data set of `row_count` rows
    pub fn effective_batch_size(&self, row_count: usize) -> usize {
        if self.use_batch_write {
            self.batch_size.max(1)
        } else {
            row_count.max(1)
        }
    }

    /// Whether `row_count` rows should be materialized in parallel
    pub fn is_parallel(&self, row_count: usize) -> bool {
        row_count > self.parallel_processing_threshold
    }
}

/// Options consumed by [`crate::import::TableImporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImportOptions {
    /// Zero-based header row; `None` synthesizes `Column0`, `Column1`, ...
    pub header_row: Option<usize>,
    /// Drop rows on which every cell decodes to the missing sentinel
    pub skip_blank_rows: bool,
    /// Inserted between a duplicate header name and its column index
    pub duplicate_marker: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            header_row: Some(0),
            skip_blank_rows: false,
            duplicate_marker: "_dup".to_string(),
        }
    }
}

impl ImportOptions {
    /// Read column names from the given row
    pub fn with_header_row(mut self, row: usize) -> Self {
        self.header_row = Some(row);
        self
    }

    /// Treat every row as data and synthesize column names
    pub fn without_header(mut self) -> Self {
        self.header_row = None;
        self
    }

    /// Drop fully blank rows
    pub fn with_skip_blank_rows(mut self, skip: bool) -> Self {
        self.skip_blank_rows = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_batch_size() {
        let options = ExportOptions::default().with_batch_size(0);
        assert_eq!(options.effective_batch_size(10), 1);

        let options = ExportOptions::default().with_batch_write(false);
        assert_eq!(options.effective_batch_size(12_345), 12_345);
    }

    #[test]
    fn test_parallel_threshold_is_exclusive() {
        let options = ExportOptions::default().with_parallel_processing_threshold(10_000);
        assert!(!options.is_parallel(10_000));
        assert!(options.is_parallel(10_001));
    }
}
