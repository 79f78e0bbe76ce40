//! In-memory spreadsheet document
//!
//! A workbook owns one style table and any number of worksheets. Rows and
//! cells are created on demand. The exporter writes into this model; the
//! importer reads from it through [`SheetView`]. Turning it into bytes is the
//! job of [`crate::writer::ExcelWriter`], loading it from a file the job of
//! [`crate::reader::ExcelReader`].

use std::collections::BTreeMap;

use crate::codec::CellContent;
use crate::config::MAX_SHEET_NAME_LEN;
use crate::error::{ExcelError, Result};
use crate::types::{CellSlot, RawCellValue};

/// Characters not allowed in sheet names
const ILLEGAL_SHEET_CHARS: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// First id available for custom number formats
const FIRST_CUSTOM_NUM_FMT_ID: u16 = 164;

/// Built-in number formats every reader knows by id
const BUILTIN_NUM_FMTS: [(u16, &str); 24] = [
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

/// Opaque reference to a cell format in a workbook's style table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleHandle(u32);

impl StyleHandle {
    /// Index of the cell format (`cellXfs` position)
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Horizontal alignment of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

impl HorizontalAlign {
    /// Attribute value in the package
    pub fn as_str(&self) -> &'static str {
        match self {
            HorizontalAlign::Left => "left",
            HorizontalAlign::Center => "center",
            HorizontalAlign::Right => "right",
        }
    }
}

/// Font definition
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// Font family
    pub name: String,
    /// Size in points
    pub size: f64,
    /// Bold weight
    pub bold: bool,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            name: "Calibri".to_string(),
            size: 11.0,
            bold: false,
        }
    }
}

/// Everything needed to build one cell format
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleSpec {
    /// Number format code; `None` means General
    pub num_format: Option<String>,
    /// Bold font
    pub bold: bool,
    /// Font size override in points
    pub font_size: Option<f64>,
    /// Horizontal alignment
    pub align: Option<HorizontalAlign>,
}

/// A cell format entry (`xf` record)
#[derive(Debug, Clone, PartialEq)]
pub struct CellFormat {
    /// Number format id
    pub num_fmt_id: u16,
    /// Index into the font list
    pub font_id: usize,
    /// Horizontal alignment
    pub align: Option<HorizontalAlign>,
}

/// Fonts, number formats and cell formats of a workbook
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    fonts: Vec<Font>,
    custom_num_fmts: Vec<(u16, String)>,
    cell_formats: Vec<CellFormat>,
}

impl StyleTable {
    /// Create a table holding the default font and the default cell format
    pub fn new() -> Self {
        StyleTable {
            fonts: vec![Font::default()],
            custom_num_fmts: Vec::new(),
            cell_formats: vec![CellFormat {
                num_fmt_id: 0,
                font_id: 0,
                align: None,
            }],
        }
    }

    /// Add a font and return its index
    pub fn create_font(&mut self, font: Font) -> usize {
        self.fonts.push(font);
        self.fonts.len() - 1
    }

    /// Get the id of a number format, registering it if it is new
    pub fn create_number_format(&mut self, code: &str) -> u16 {
        if let Some((id, _)) = BUILTIN_NUM_FMTS.iter().find(|(_, c)| *c == code) {
            return *id;
        }
        if let Some((id, _)) = self.custom_num_fmts.iter().find(|(_, c)| c == code) {
            return *id;
        }
        let id = FIRST_CUSTOM_NUM_FMT_ID + self.custom_num_fmts.len() as u16;
        self.custom_num_fmts.push((id, code.to_string()));
        id
    }

    /// Build a new cell format
    ///
    /// Every call adds an entry; reuse is the caller's concern (see
    /// [`crate::style::StyleCache`]).
    pub fn create_style(&mut self, spec: &StyleSpec) -> StyleHandle {
        let num_fmt_id = spec
            .num_format
            .as_deref()
            .map(|code| self.create_number_format(code))
            .unwrap_or(0);

        let font_id = if spec.bold || spec.font_size.is_some() {
            self.create_font(Font {
                bold: spec.bold,
                size: spec.font_size.unwrap_or(11.0),
                ..Font::default()
            })
        } else {
            0
        };

        self.cell_formats.push(CellFormat {
            num_fmt_id,
            font_id,
            align: spec.align,
        });
        log::debug!(
            "created cell format {} (numFmtId={}, font={})",
            self.cell_formats.len() - 1,
            num_fmt_id,
            font_id
        );
        StyleHandle((self.cell_formats.len() - 1) as u32)
    }

    /// First cell format showing a date in the default font, if any
    pub fn find_date_style(&self) -> Option<StyleHandle> {
        (0..self.cell_formats.len())
            .map(|index| StyleHandle(index as u32))
            .find(|&handle| {
                self.cell_format(handle)
                    .is_some_and(|format| format.font_id == 0)
                    && self.is_date_style(handle)
            })
    }

    /// Number of cell formats, including the default one
    pub fn style_count(&self) -> usize {
        self.cell_formats.len()
    }

    /// Get a cell format
    pub fn cell_format(&self, handle: StyleHandle) -> Option<&CellFormat> {
        self.cell_formats.get(handle.0 as usize)
    }

    /// All cell formats in index order
    pub fn cell_formats(&self) -> &[CellFormat] {
        &self.cell_formats
    }

    /// All fonts in index order
    pub fn fonts(&self) -> &[Font] {
        &self.fonts
    }

    /// Custom number formats as `(id, code)`
    pub fn custom_number_formats(&self) -> &[(u16, String)] {
        &self.custom_num_fmts
    }

    /// Code of a built-in or custom number format
    pub fn number_format_code(&self, id: u16) -> Option<&str> {
        BUILTIN_NUM_FMTS
            .iter()
            .find(|(builtin, _)| *builtin == id)
            .map(|(_, code)| *code)
            .or_else(|| {
                self.custom_num_fmts
                    .iter()
                    .find(|(custom, _)| *custom == id)
                    .map(|(_, code)| code.as_str())
            })
    }

    /// Whether a cell format shows its number as a date or time
    pub fn is_date_style(&self, handle: StyleHandle) -> bool {
        self.cell_format(handle)
            .and_then(|xf| self.number_format_code(xf.num_fmt_id))
            .is_some_and(is_date_format_code)
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a number format code displays a date or time
///
/// Quoted literals, escaped characters and bracketed sections (colors,
/// locales) are skipped; elapsed-time sections such as `[h]` count as time.
pub fn is_date_format_code(code: &str) -> bool {
    let mut chars = code.chars();
    let mut in_quotes = false;

    while let Some(ch) = chars.next() {
        if in_quotes {
            in_quotes = ch != '"';
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let section: String = chars.by_ref().take_while(|c| *c != ']').collect();
                if !section.is_empty()
                    && section
                        .chars()
                        .all(|c| matches!(c.to_ascii_lowercase(), 'h' | 'm' | 's'))
                {
                    return true;
                }
            }
            'y' | 'Y' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' | 'm' | 'M' => return true,
            _ => {}
        }
    }
    false
}

/// Stored content of a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellData {
    /// Blank cell
    #[default]
    Blank,
    /// Text
    Text(String),
    /// Number; dates are serials with a date style
    Number(f64),
    /// Boolean
    Boolean(bool),
    /// Error code such as `#DIV/0!`
    Error(String),
    /// Formula with the cached result of its last evaluation
    Formula {
        formula: String,
        cached: Box<CellData>,
    },
}

impl From<CellContent> for CellData {
    fn from(content: CellContent) -> Self {
        match content {
            CellContent::Text(s) => CellData::Text(s),
            CellContent::Number(n) => CellData::Number(n),
            CellContent::Boolean(b) => CellData::Boolean(b),
        }
    }
}

impl From<&str> for CellData {
    fn from(s: &str) -> Self {
        CellData::Text(s.to_string())
    }
}

impl From<String> for CellData {
    fn from(s: String) -> Self {
        CellData::Text(s)
    }
}

impl From<f64> for CellData {
    fn from(n: f64) -> Self {
        CellData::Number(n)
    }
}

impl From<bool> for CellData {
    fn from(b: bool) -> Self {
        CellData::Boolean(b)
    }
}

/// A cell: content plus optional style
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    /// Cell content
    pub value: CellData,
    /// Cell format; `None` uses the default format
    pub style: Option<StyleHandle>,
}

impl Cell {
    /// Replace the content
    pub fn set_value(&mut self, value: impl Into<CellData>) {
        self.value = value.into();
    }

    /// Attach a style
    pub fn set_style(&mut self, style: StyleHandle) {
        self.style = Some(style);
    }

    /// Text of a text cell, or of a formula's cached text
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            CellData::Text(s) => Some(s),
            CellData::Formula { cached, .. } => match cached.as_ref() {
                CellData::Text(s) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A row of cells, dense from column 0
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    /// Get or create the cell at `col`
    pub fn create_cell(&mut self, col: u32) -> &mut Cell {
        let col = col as usize;
        if col >= self.cells.len() {
            self.cells.resize_with(col + 1, Cell::default);
        }
        &mut self.cells[col]
    }

    /// Get the cell at `col`
    pub fn cell(&self, col: u32) -> Option<&Cell> {
        self.cells.get(col as usize)
    }

    /// Cells in column order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of allocated cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A merged rectangular range, zero-based and inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    pub first: CellSlot,
    pub last: CellSlot,
}

impl MergeRange {
    /// `A1:C1` notation
    pub fn reference(&self) -> String {
        format!("{}:{}", self.first.reference(), self.last.reference())
    }
}

/// A worksheet: sparse rows, merged ranges and column widths
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Worksheet {
    name: String,
    rows: BTreeMap<u32, Row>,
    merges: Vec<MergeRange>,
    column_widths: BTreeMap<u32, f64>,
}

impl Worksheet {
    fn new(name: String) -> Self {
        Worksheet {
            name,
            ..Default::default()
        }
    }

    /// Sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get or create the row at `index`
    pub fn create_row(&mut self, index: u32) -> &mut Row {
        self.rows.entry(index).or_default()
    }

    /// Get the row at `index`
    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows.get(&index)
    }

    /// Rows with their indices, in order
    pub fn rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows.iter().map(|(index, row)| (*index, row))
    }

    /// Get the cell at a slot
    pub fn cell(&self, slot: CellSlot) -> Option<&Cell> {
        self.row(slot.row).and_then(|row| row.cell(slot.column))
    }

    /// Set a cell's content and style in one step
    pub fn set_cell(&mut self, slot: CellSlot, value: impl Into<CellData>, style: Option<StyleHandle>) {
        let cell = self.create_row(slot.row).create_cell(slot.column);
        cell.set_value(value);
        cell.style = style;
    }

    /// Merge a range of cells
    pub fn merge(&mut self, first: CellSlot, last: CellSlot) {
        self.merges.push(MergeRange { first, last });
    }

    /// Merged ranges
    pub fn merges(&self) -> &[MergeRange] {
        &self.merges
    }

    /// Set a column width in characters
    pub fn set_column_width(&mut self, col: u32, width: f64) {
        self.column_widths.insert(col, width);
    }

    /// Width of a column, if one was set
    pub fn column_width(&self, col: u32) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    /// Column widths in column order
    pub fn column_widths(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.column_widths.iter().map(|(col, width)| (*col, *width))
    }

    /// Index of the last row, if any
    pub fn last_row_index(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    /// Widest row, in cells
    pub fn max_column_count(&self) -> usize {
        self.rows.values().map(Row::len).max().unwrap_or(0)
    }
}

/// A workbook: style table plus worksheets
///
/// # Examples
///
/// ```
/// use sheetbind::document::Workbook;
/// use sheetbind::types::CellSlot;
///
/// let mut workbook = Workbook::new();
/// let index = workbook.create_sheet("Data");
/// let sheet = workbook.sheet_mut(index).unwrap();
/// sheet.set_cell(CellSlot::new(0, 0), "Hello", None);
/// assert_eq!(workbook.sheet_names(), vec!["Data".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    styles: StyleTable,
    sheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create an empty workbook
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet and return its index
    ///
    /// The name is made legal (illegal characters replaced, 31 characters at
    /// most) and unique within the workbook.
    pub fn create_sheet(&mut self, name: &str) -> usize {
        let base = sanitize_sheet_name(name);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.sheet_index(&candidate).is_some() {
            suffix += 1;
            let tail = format!(" ({})", suffix);
            let keep = MAX_SHEET_NAME_LEN.saturating_sub(tail.chars().count());
            candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), tail);
        }

        self.sheets.push(Worksheet::new(candidate));
        self.sheets.len() - 1
    }

    /// Get a worksheet by index
    pub fn sheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.sheets.get_mut(index)
    }

    /// Find a sheet index by name (case-insensitive)
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Get a worksheet by name
    pub fn sheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheet_index(name).and_then(|i| self.sheet(i))
    }

    /// All worksheets
    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    /// Sheet names in order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// The style table
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// The style table, mutable
    pub fn styles_mut(&mut self) -> &mut StyleTable {
        &mut self.styles
    }

    /// Borrow the style table and one worksheet mutably at the same time
    pub fn parts_mut(&mut self, index: usize) -> Option<(&mut StyleTable, &mut Worksheet)> {
        let sheet = self.sheets.get_mut(index)?;
        Some((&mut self.styles, sheet))
    }

    /// Read-side view of a sheet by index
    pub fn view(&self, index: usize) -> Result<SheetView<'_>> {
        let sheet = self.sheets.get(index).ok_or_else(|| ExcelError::SheetNotFound {
            sheet: format!("index {}", index),
            available: self.sheet_names().join(", "),
        })?;
        Ok(SheetView {
            styles: &self.styles,
            sheet,
        })
    }

    /// Read-side view of a sheet by name
    pub fn view_by_name(&self, name: &str) -> Result<SheetView<'_>> {
        let index = self
            .sheet_index(name)
            .ok_or_else(|| ExcelError::SheetNotFound {
                sheet: name.to_string(),
                available: self.sheet_names().join(", "),
            })?;
        self.view(index)
    }
}

/// Read access to one worksheet together with the workbook's styles
#[derive(Debug, Clone, Copy)]
pub struct SheetView<'a> {
    styles: &'a StyleTable,
    sheet: &'a Worksheet,
}

impl<'a> SheetView<'a> {
    /// The underlying worksheet
    pub fn sheet(&self) -> &'a Worksheet {
        self.sheet
    }

    /// Sheet name
    pub fn name(&self) -> &'a str {
        &self.sheet.name
    }

    /// Number of rows up to and including the last one present
    pub fn row_span(&self) -> usize {
        self.sheet.last_row_index().map_or(0, |last| last as usize + 1)
    }

    /// Whether a cell's number format shows a date
    pub fn is_date_formatted(&self, cell: &Cell) -> bool {
        cell.style.is_some_and(|style| self.styles.is_date_style(style))
    }

    /// The cell at a slot, as the codec sees it
    pub fn raw_value(&self, slot: CellSlot) -> RawCellValue {
        match self.sheet.cell(slot) {
            Some(cell) => self.raw_from_data(&cell.value, self.is_date_formatted(cell)),
            None => RawCellValue::Empty,
        }
    }

    fn raw_from_data(&self, data: &CellData, date_formatted: bool) -> RawCellValue {
        match data {
            CellData::Blank => RawCellValue::Empty,
            CellData::Text(s) => RawCellValue::Text(s.clone()),
            CellData::Number(value) => RawCellValue::Number {
                value: *value,
                date_formatted,
            },
            CellData::Boolean(b) => RawCellValue::Boolean(*b),
            CellData::Error(e) => RawCellValue::Error(e.clone()),
            CellData::Formula { cached, .. } => RawCellValue::Formula {
                cached: Box::new(self.raw_from_data(cached, date_formatted)),
            },
        }
    }
}

/// Make a sheet name legal
pub fn sanitize_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if ILLEGAL_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim().trim_matches('\'');
    if trimmed.is_empty() {
        return "Sheet".to_string();
    }
    trimmed.chars().take(MAX_SHEET_NAME_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_format_ids() {
        let mut styles = StyleTable::new();
        assert_eq!(styles.create_number_format("0.00"), 2);
        assert_eq!(styles.create_number_format("yyyy-mm-dd"), 164);
        assert_eq!(styles.create_number_format("yyyy-mm-dd"), 164);
        assert_eq!(styles.create_number_format("0.000"), 165);
        assert_eq!(styles.number_format_code(165), Some("0.000"));
    }

    #[test]
    fn test_date_format_detection() {
        assert!(is_date_format_code("yyyy-mm-dd"));
        assert!(is_date_format_code("[h]:mm:ss"));
        assert!(is_date_format_code("[$-409]d-mmm-yy"));
        assert!(!is_date_format_code("General"));
        assert!(!is_date_format_code("#,##0.00"));
        assert!(!is_date_format_code("0.00\"days\""));
        assert!(!is_date_format_code("[Red]0.00"));
    }

    #[test]
    fn test_date_style() {
        let mut styles = StyleTable::new();
        let date = styles.create_style(&StyleSpec {
            num_format: Some("dd/mm/yyyy".to_string()),
            ..Default::default()
        });
        let number = styles.create_style(&StyleSpec {
            num_format: Some("0".to_string()),
            ..Default::default()
        });
        assert!(styles.is_date_style(date));
        assert!(!styles.is_date_style(number));
        assert_eq!(styles.style_count(), 3);
    }

    #[test]
    fn test_sheet_names_are_sanitized_and_unique() {
        let mut workbook = Workbook::new();
        workbook.create_sheet("Q1/Q2 [draft]");
        workbook.create_sheet("q1_q2 _draft_");
        workbook.create_sheet("");
        assert_eq!(
            workbook.sheet_names(),
            vec!["Q1_Q2 _draft_", "q1_q2 _draft_ (2)", "Sheet"]
        );

        let long = "x".repeat(40);
        let first = workbook.create_sheet(&long);
        let second = workbook.create_sheet(&long);
        assert_eq!(workbook.sheet(first).unwrap().name().len(), 31);
        assert_eq!(workbook.sheet(second).unwrap().name().len(), 31);
        assert!(workbook.sheet(second).unwrap().name().ends_with(" (2)"));
    }

    #[test]
    fn test_raw_value_marks_date_cells() {
        let mut workbook = Workbook::new();
        let index = workbook.create_sheet("Data");
        let (styles, sheet) = workbook.parts_mut(index).unwrap();
        let date = styles.create_style(&StyleSpec {
            num_format: Some("yyyy-mm-dd".to_string()),
            ..Default::default()
        });
        sheet.set_cell(CellSlot::new(0, 0), 44927.0, Some(date));
        sheet.set_cell(CellSlot::new(0, 1), 44927.0, None);

        let view = workbook.view(index).unwrap();
        assert_eq!(
            view.raw_value(CellSlot::new(0, 0)),
            RawCellValue::Number {
                value: 44927.0,
                date_formatted: true
            }
        );
        assert_eq!(
            view.raw_value(CellSlot::new(0, 1)),
            RawCellValue::Number {
                value: 44927.0,
                date_formatted: false
            }
        );
        assert_eq!(view.raw_value(CellSlot::new(5, 5)), RawCellValue::Empty);
    }

    #[test]
    fn test_missing_sheet() {
        let workbook = Workbook::new();
        assert!(matches!(
            workbook.view_by_name("Nope"),
            Err(ExcelError::SheetNotFound { .. })
        ));
    }
}
