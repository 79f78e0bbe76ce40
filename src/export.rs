//! Table export
//!
//! [`TableExporter`] turns a slice of records or a [`DataTable`] into a
//! worksheet: optional merged title, bold header, typed data rows, fitted
//! column widths.

use crate::batch::{BatchRowWriter, RowSource};
use crate::config::{ExportOptions, MAX_COLUMNS, MAX_ROWS};
use crate::document::Workbook;
use crate::error::{ExcelError, Result};
use crate::record::{DataTable, TableRecord};
use crate::style::StyleCache;
use crate::types::{CellSlot, Column, EmptyReason, FormatKind, TableOutcome, Value};
use crate::width::ColumnWidthTracker;

/// What one export wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Index of the new sheet in the workbook
    pub sheet_index: usize,
    /// Final (sanitized, unique) sheet name
    pub sheet_name: String,
    /// Data rows written, header and title excluded
    pub rows: usize,
    /// Columns written
    pub columns: usize,
    /// Sheet row of the header
    pub header_row: u32,
    /// Fitted widths of the exported columns, in the order they were given;
    /// empty when auto-fit is off
    pub column_widths: Vec<usize>,
    /// Whether values were materialized in parallel
    pub parallel: bool,
}

/// Adapts a record slice to the row writer
struct RecordRows<'a, T>(&'a [T]);

impl<T: TableRecord + Sync> RowSource for RecordRows<'_, T> {
    fn row_count(&self) -> usize {
        self.0.len()
    }

    fn value(&self, row: usize, column: &Column) -> Value {
        self.0
            .get(row)
            .map_or(Value::Null, |record| record.value(column.ordinal))
    }
}

/// Writes tables into workbooks
///
/// # Examples
///
/// ```
/// use sheetbind::export::TableExporter;
/// use sheetbind::record::DataTable;
/// use sheetbind::types::{TypeTag, Value};
///
/// let mut table = DataTable::new();
/// table.add_column("Id", TypeTag::Integer);
/// table.add_column("Name", TypeTag::String);
/// table.push_row(vec![Value::from(1), Value::from("Alice")]);
///
/// let exporter = TableExporter::default();
/// let workbook = exporter
///     .export_table(&table, "People", Some("Staff"))?
///     .into_produced()
///     .expect("one row to export");
/// assert_eq!(workbook.sheet_names(), vec!["People".to_string()]);
/// # Ok::<(), sheetbind::ExcelError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableExporter {
    options: ExportOptions,
}

impl TableExporter {
    /// Create an exporter with the given options
    pub fn new(options: ExportOptions) -> Self {
        TableExporter { options }
    }

    /// Export options in use
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export records into a new workbook
    pub fn export_records<T>(
        &self,
        records: &[T],
        sheet_name: &str,
        title: Option<&str>,
    ) -> Result<TableOutcome<Workbook>>
    where
        T: TableRecord + Sync,
    {
        let columns = T::columns();
        self.export_new(&RecordRows(records), &columns, sheet_name, title)
    }

    /// Export a generic table into a new workbook
    pub fn export_table(
        &self,
        table: &DataTable,
        sheet_name: &str,
        title: Option<&str>,
    ) -> Result<TableOutcome<Workbook>> {
        self.export_new(table, table.columns(), sheet_name, title)
    }

    /// Export records as a new sheet of an existing workbook
    pub fn export_records_into<T>(
        &self,
        workbook: &mut Workbook,
        records: &[T],
        sheet_name: &str,
        title: Option<&str>,
    ) -> Result<TableOutcome<ExportSummary>>
    where
        T: TableRecord + Sync,
    {
        let columns = T::columns();
        self.export_into(workbook, &RecordRows(records), &columns, sheet_name, title)
    }

    fn export_new<S>(
        &self,
        source: &S,
        columns: &[Column],
        sheet_name: &str,
        title: Option<&str>,
    ) -> Result<TableOutcome<Workbook>>
    where
        S: RowSource + ?Sized,
    {
        let mut workbook = Workbook::new();
        Ok(
            match self.export_into(&mut workbook, source, columns, sheet_name, title)? {
                TableOutcome::Produced(_) => TableOutcome::Produced(workbook),
                TableOutcome::Empty(reason) => TableOutcome::Empty(reason),
            },
        )
    }

    /// Export any row source as a new sheet of `workbook`
    ///
    /// Nothing is added to the workbook when the source has no rows or no
    /// columns. Sources that do not fit into one worksheet are rejected
    /// before anything is written.
    pub fn export_into<S>(
        &self,
        workbook: &mut Workbook,
        source: &S,
        columns: &[Column],
        sheet_name: &str,
        title: Option<&str>,
    ) -> Result<TableOutcome<ExportSummary>>
    where
        S: RowSource + ?Sized,
    {
        let row_count = source.row_count();
        if row_count == 0 {
            log::debug!("nothing to export to '{}': no rows", sheet_name);
            return Ok(TableOutcome::Empty(EmptyReason::NoRows));
        }
        if columns.is_empty() {
            log::debug!("nothing to export to '{}': no columns", sheet_name);
            return Ok(TableOutcome::Empty(EmptyReason::NoColumns));
        }

        let title_rows = usize::from(title.is_some());
        let total_rows = title_rows + 1 + row_count;
        if total_rows > MAX_ROWS {
            return Err(ExcelError::RowLimitExceeded {
                rows: total_rows,
                limit: MAX_ROWS,
            });
        }
        // cells land at their column's ordinal, so the sheet spans up to the largest one
        let column_span = columns
            .iter()
            .map(|column| column.ordinal)
            .max()
            .map_or(0, |max| max + 1);
        if column_span > MAX_COLUMNS {
            return Err(ExcelError::ColumnLimitExceeded {
                columns: column_span,
                limit: MAX_COLUMNS,
            });
        }

        let sheet_index = workbook.create_sheet(sheet_name);
        let (styles, sheet) = workbook.parts_mut(sheet_index).ok_or_else(|| {
            ExcelError::WriteError(format!("Sheet '{}' was not created", sheet_name))
        })?;
        let mut cache = StyleCache::new(&self.options);
        let widths = ColumnWidthTracker::new(column_span);
        let last_column = (column_span - 1) as u32;

        if let Some(title) = title {
            let style = cache.get_or_create(styles, FormatKind::Title);
            sheet.set_cell(CellSlot::new(0, 0), title, Some(style));
            if last_column > 0 {
                sheet.merge(CellSlot::new(0, 0), CellSlot::new(0, last_column));
            }
        }

        let header_row = title_rows as u32;
        let header_style = cache.get_or_create(styles, FormatKind::Header);
        for column in columns {
            sheet.set_cell(
                CellSlot::new(header_row, column.ordinal as u32),
                column.name.as_str(),
                Some(header_style),
            );
            widths.observe_text(column.ordinal, &column.name);
        }

        let stats = BatchRowWriter::new(&self.options, columns, &widths).write_rows(
            source,
            header_row + 1,
            sheet,
            styles,
            &mut cache,
        )?;

        let column_widths = if self.options.auto_fit_columns {
            let fitted = widths.finalize(
                self.options.column_width_padding,
                self.options.max_column_width,
            );
            columns
                .iter()
                .map(|column| {
                    let width = fitted[column.ordinal];
                    sheet.set_column_width(column.ordinal as u32, width as f64);
                    width
                })
                .collect()
        } else {
            Vec::new()
        };

        let summary = ExportSummary {
            sheet_index,
            sheet_name: sheet.name().to_string(),
            rows: stats.rows,
            columns: columns.len(),
            header_row,
            column_widths,
            parallel: stats.parallel,
        };
        log::info!(
            "exported {} rows x {} columns to '{}' in {} batches",
            summary.rows,
            summary.columns,
            summary.sheet_name,
            stats.batches
        );

        Ok(TableOutcome::Produced(summary))
    }
}
