//! Batched row writing
//!
//! Rows go through two phases. Materialization encodes every value of a batch
//! into a pre-sized buffer, one slot per row; above the configured threshold
//! this runs on a rayon pool. Write-back then walks the buffer in order on the
//! calling thread, attaching cached styles and storing cells into the sheet.
//! The sheet and the style cache are never touched by workers, and row order
//! in the sheet always matches source order.

use std::ops::Range;

use crate::codec::{encode, EncodedCell};
use crate::config::ExportOptions;
use crate::document::{StyleTable, Worksheet};
use crate::error::Result;
use crate::style::StyleCache;
use crate::types::{CellSlot, Column, Value};
use crate::width::ColumnWidthTracker;

/// Source of data rows for the writer
///
/// Implementations must be `Sync` since values may be read from several
/// worker threads at once.
pub trait RowSource: Sync {
    /// Number of data rows
    fn row_count(&self) -> usize;

    /// Value of `column` on data row `row`
    fn value(&self, row: usize, column: &Column) -> Value;
}

/// What a call to [`BatchRowWriter::write_rows`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteStats {
    /// Data rows written
    pub rows: usize,
    /// Batches written
    pub batches: usize,
    /// Whether materialization ran in parallel
    pub parallel: bool,
}

/// Writes the data rows of one export into a sheet
pub struct BatchRowWriter<'a> {
    options: &'a ExportOptions,
    columns: &'a [Column],
    widths: &'a ColumnWidthTracker,
}

impl<'a> BatchRowWriter<'a> {
    /// Create a writer for `columns`, reporting widths into `widths`
    pub fn new(
        options: &'a ExportOptions,
        columns: &'a [Column],
        widths: &'a ColumnWidthTracker,
    ) -> Self {
        BatchRowWriter {
            options,
            columns,
            widths,
        }
    }

    /// Write all rows of `source`, the first one at sheet row `first_row`
    pub fn write_rows<S>(
        &self,
        source: &S,
        first_row: u32,
        sheet: &mut Worksheet,
        styles: &mut StyleTable,
        cache: &mut StyleCache,
    ) -> Result<WriteStats>
    where
        S: RowSource + ?Sized,
    {
        let row_count = source.row_count();
        let batch_size = self.options.effective_batch_size(row_count);
        let parallel = self.use_parallel(row_count);
        log::debug!(
            "writing {} rows in batches of {} ({})",
            row_count,
            batch_size,
            if parallel { "parallel" } else { "sequential" }
        );

        let materializer = Materializer::new(self, parallel)?;
        let mut stats = WriteStats {
            parallel,
            ..Default::default()
        };

        let mut start = 0;
        while start < row_count {
            let end = (start + batch_size).min(row_count);
            let buffer = materializer.run(source, start..end);
            self.write_batch(buffer, first_row + start as u32, sheet, styles, cache);

            stats.rows += end - start;
            stats.batches += 1;
            start = end;
        }

        Ok(stats)
    }

    fn use_parallel(&self, row_count: usize) -> bool {
        if !self.options.is_parallel(row_count) {
            return false;
        }
        if cfg!(feature = "parallel") {
            true
        } else {
            log::debug!("parallel feature disabled, materializing sequentially");
            false
        }
    }

    /// Encode one row and record its widths
    fn encode_row<S>(&self, source: &S, row: usize) -> Vec<EncodedCell>
    where
        S: RowSource + ?Sized,
    {
        self.columns
            .iter()
            .map(|column| {
                let cell = encode(&source.value(row, column), column.declared_type);
                if self.options.auto_fit_columns {
                    self.widths.observe(
                        column.ordinal,
                        cell.rendered_len(&self.options.default_date_format),
                    );
                }
                cell
            })
            .collect()
    }

    fn write_batch(
        &self,
        buffer: Vec<Vec<EncodedCell>>,
        first_row: u32,
        sheet: &mut Worksheet,
        styles: &mut StyleTable,
        cache: &mut StyleCache,
    ) {
        for (offset, cells) in buffer.into_iter().enumerate() {
            let row_index = first_row + offset as u32;
            for (column, cell) in self.columns.iter().zip(cells) {
                let style = cache.get_or_create(styles, cell.kind);
                sheet.set_cell(
                    CellSlot::new(row_index, column.ordinal as u32),
                    cell.content,
                    Some(style),
                );
            }
        }
    }
}

/// Runs the materialization phase, sequentially or on a worker pool
struct Materializer<'w, 'a> {
    writer: &'w BatchRowWriter<'a>,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel: bool,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl<'w, 'a> Materializer<'w, 'a> {
    fn new(writer: &'w BatchRowWriter<'a>, parallel: bool) -> Result<Self> {
        #[cfg(feature = "parallel")]
        let pool = match writer.options.max_parallelism {
            Some(threads) if parallel => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads.max(1))
                    .build()
                    .map_err(|e| {
                        crate::error::ExcelError::WriteError(format!(
                            "Failed to start worker pool: {}",
                            e
                        ))
                    })?,
            ),
            _ => None,
        };

        Ok(Materializer {
            writer,
            parallel,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    fn run<S>(&self, source: &S, rows: Range<usize>) -> Vec<Vec<EncodedCell>>
    where
        S: RowSource + ?Sized,
    {
        #[cfg(feature = "parallel")]
        if self.parallel {
            return self.run_parallel(source, rows);
        }

        rows.map(|row| self.writer.encode_row(source, row)).collect()
    }

    #[cfg(feature = "parallel")]
    fn run_parallel<S>(&self, source: &S, rows: Range<usize>) -> Vec<Vec<EncodedCell>>
    where
        S: RowSource + ?Sized,
    {
        use rayon::prelude::*;

        let writer = self.writer;
        let mut buffer = Vec::with_capacity(rows.len());
        let fill = |buffer: &mut Vec<Vec<EncodedCell>>| {
            rows.into_par_iter()
                .map(|row| writer.encode_row(source, row))
                .collect_into_vec(buffer);
        };

        match &self.pool {
            Some(pool) => pool.install(|| fill(&mut buffer)),
            None => fill(&mut buffer),
        }
        buffer
    }
}
