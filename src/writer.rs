//! Saving workbooks as `.xlsx`

use crate::document::Workbook;
use crate::error::Result;
use crate::fast_writer::write_package;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Buffer size between the package writer and the file
const FILE_BUFFER_SIZE: usize = 64 * 1024;

/// Writes workbooks to files, byte buffers or any seekable writer
///
/// # Examples
///
/// ```no_run
/// use sheetbind::document::Workbook;
/// use sheetbind::types::CellSlot;
/// use sheetbind::writer::ExcelWriter;
///
/// let mut workbook = Workbook::new();
/// let index = workbook.create_sheet("Report");
/// workbook
///     .sheet_mut(index)
///     .unwrap()
///     .set_cell(CellSlot::new(0, 0), "Total", None);
///
/// ExcelWriter::new().save(&workbook, "report.xlsx")?;
/// # Ok::<(), sheetbind::ExcelError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExcelWriter {
    compression_level: Option<i64>,
}

impl ExcelWriter {
    /// Create a writer with the default compression level
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deflate level (1-9)
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = Some(level.clamp(1, 9));
        self
    }

    /// Save `workbook` to `path`
    ///
    /// The package is written to a temporary file in the same directory and
    /// moved over `path` once complete, so an existing file is either fully
    /// replaced or left untouched.
    pub fn save<P: AsRef<Path>>(&self, workbook: &Workbook, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let writer = BufWriter::with_capacity(FILE_BUFFER_SIZE, temp.as_file_mut());
            let mut writer = self.write_to(workbook, writer)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path)?;

        log::info!(
            "saved {} sheets to {}",
            workbook.sheets().len(),
            path.display()
        );
        Ok(())
    }

    /// Serialize `workbook` into memory
    pub fn to_bytes(&self, workbook: &Workbook) -> Result<Vec<u8>> {
        Ok(self.write_to(workbook, Cursor::new(Vec::new()))?.into_inner())
    }

    /// Serialize `workbook` into any seekable writer and hand it back
    pub fn write_to<W: Write + Seek>(&self, workbook: &Workbook, writer: W) -> Result<W> {
        write_package(workbook, writer, self.compression_level)
    }
}
