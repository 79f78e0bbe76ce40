//! Loading `.xlsx`, `.xls` and `.ods` files into a [`Workbook`]

use crate::codec::{datetime_to_serial, parse_datetime_str};
use crate::config::ExportOptions;
use crate::document::{CellData, StyleHandle, StyleTable, Workbook, Worksheet};
use crate::error::{ExcelError, Result};
use crate::style::StyleCache;
use crate::types::{CellSlot, FormatKind};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Spreadsheet file reader
///
/// Cell contents are copied into the in-memory document model. Date cells
/// become serial numbers carrying a date style, so the importer decodes them
/// the same way as cells written by the exporter. Formula cells keep their
/// formula text next to the cached result.
pub struct ExcelReader {
    workbook: Sheets<BufReader<File>>,
}

impl ExcelReader {
    /// Open a spreadsheet file for reading
    ///
    /// Supports XLSX, XLS, and ODS formats. Format is auto-detected from file extension.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sheetbind::reader::ExcelReader;
    ///
    /// let reader = ExcelReader::open("data.xlsx")?;
    /// println!("{:?}", reader.sheet_names());
    /// # Ok::<(), sheetbind::ExcelError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let workbook =
            open_workbook_auto(path).map_err(|e| ExcelError::ReadError(e.to_string()))?;

        Ok(ExcelReader { workbook })
    }

    /// Open a file and load every sheet
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        Self::open(path)?.into_workbook()
    }

    /// Get list of sheet names in the workbook
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// Get the number of sheets in the workbook
    pub fn sheet_count(&self) -> usize {
        self.workbook.sheet_names().len()
    }

    /// Load every sheet, in file order
    pub fn into_workbook(mut self) -> Result<Workbook> {
        let mut target = Workbook::new();
        for name in self.sheet_names() {
            self.load_sheet(&name, &mut target)?;
        }
        log::info!("loaded {} sheets", target.sheets().len());
        Ok(target)
    }

    /// Load one sheet as a new sheet of `target` and return its index
    ///
    /// Date cells share the date style already present in `target`, so
    /// loading several sheets into one workbook adds a single date format.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sheetbind::document::Workbook;
    /// use sheetbind::reader::ExcelReader;
    ///
    /// let mut reader = ExcelReader::open("data.xlsx")?;
    /// let mut workbook = Workbook::new();
    /// let index = reader.read_sheet("Sheet1", &mut workbook)?;
    /// let view = workbook.view(index)?;
    /// # Ok::<(), sheetbind::ExcelError>(())
    /// ```
    pub fn read_sheet(&mut self, sheet_name: &str, target: &mut Workbook) -> Result<usize> {
        self.load_sheet(sheet_name, target)
    }

    fn load_sheet(&mut self, sheet_name: &str, target: &mut Workbook) -> Result<usize> {
        let names = self.sheet_names();
        if !names.iter().any(|name| name == sheet_name) {
            return Err(ExcelError::SheetNotFound {
                sheet: sheet_name.to_string(),
                available: names.join(", "),
            });
        }

        let range = self.workbook.worksheet_range(sheet_name)?;
        let formulas = match self.workbook.worksheet_formula(sheet_name) {
            Ok(formulas) => Some(formulas),
            Err(e) => {
                log::warn!("formulas of '{}' not loaded: {}", sheet_name, e);
                None
            }
        };

        let index = target.create_sheet(sheet_name);
        let (styles, sheet) = target.parts_mut(index).ok_or_else(|| {
            ExcelError::ReadError(format!("Sheet '{}' was not created", sheet_name))
        })?;

        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut cells = 0usize;
        let mut date_style = None;
        for (row, col, data) in range.used_cells() {
            let slot = CellSlot::new(start_row + row as u32, start_col + col as u32);
            let (value, is_date) = convert_data(data);
            let style = is_date.then(|| *date_style.get_or_insert_with(|| date_handle(styles)));
            sheet.set_cell(slot, value, style);
            cells += 1;
        }
        if let Some(formulas) = formulas {
            attach_formulas(sheet, &formulas);
        }

        log::debug!("loaded {} cells from '{}'", cells, sheet_name);
        Ok(index)
    }

    /// Get the dimensions of a sheet (rows, cols)
    pub fn dimensions(&mut self, sheet_name: &str) -> Result<(u32, u32)> {
        let range = self.workbook.worksheet_range(sheet_name)?;
        let (rows, cols) = range.get_size();
        Ok((rows as u32, cols as u32))
    }
}

/// Date style for loaded date cells: an existing one of the workbook, or a new one
fn date_handle(styles: &mut StyleTable) -> StyleHandle {
    match styles.find_date_style() {
        Some(handle) => handle,
        None => StyleCache::new(&ExportOptions::default())
            .get_or_create(styles, FormatKind::DateTimeValue),
    }
}

/// Wrap cells that have formula text into formula cells
fn attach_formulas(sheet: &mut Worksheet, formulas: &Range<String>) {
    let (start_row, start_col) = formulas.start().unwrap_or((0, 0));
    for (row, col, formula) in formulas.used_cells() {
        if formula.is_empty() {
            continue;
        }
        let slot = CellSlot::new(start_row + row as u32, start_col + col as u32);
        let (cached, style) = match sheet.cell(slot) {
            Some(cell) => (cell.value.clone(), cell.style),
            None => (CellData::Blank, None),
        };
        sheet.set_cell(
            slot,
            CellData::Formula {
                formula: formula.clone(),
                cached: Box::new(cached),
            },
            style,
        );
    }
}

/// Convert calamine data to cell content; the flag marks date values
fn convert_data(data: &Data) -> (CellData, bool) {
    match data {
        Data::Empty => (CellData::Blank, false),
        Data::String(s) => (CellData::Text(s.clone()), false),
        Data::Float(f) => (CellData::Number(*f), false),
        Data::Int(i) => (CellData::Number(*i as f64), false),
        Data::Bool(b) => (CellData::Boolean(*b), false),
        Data::DateTime(d) => (CellData::Number(d.as_f64()), true),
        Data::Error(e) => (CellData::Error(e.to_string()), false),
        Data::DateTimeIso(s) => match parse_datetime_str(s) {
            Some(dt) => (CellData::Number(datetime_to_serial(dt)), true),
            None => (CellData::Text(s.clone()), false),
        },
        Data::DurationIso(s) => (CellData::Text(s.clone()), false),
    }
}
