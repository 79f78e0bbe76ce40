//! Worksheet part serialization

use super::shared_strings::SharedStrings;
use super::xml_writer::XmlWriter;
use crate::document::{Cell, CellData, Worksheet};
use crate::error::Result;
use crate::types::{column_letter, CellSlot};
use std::io::Write;

/// Write one `xl/worksheets/sheetN.xml` part
///
/// Text goes into `shared_strings`; blank cells without a style are omitted.
pub fn write_worksheet<W: Write>(
    sheet: &Worksheet,
    shared_strings: &mut SharedStrings,
    writer: &mut XmlWriter<W>,
) -> Result<()> {
    writer.declaration()?;
    writer.start_element("worksheet")?;
    writer.attribute(
        "xmlns",
        "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
    )?;
    writer.attribute(
        "xmlns:r",
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
    )?;
    writer.close_start_tag()?;

    writer.start_element("dimension")?;
    writer.attribute("ref", &dimension(sheet))?;
    writer.close_empty()?;

    let mut widths = sheet.column_widths().peekable();
    if widths.peek().is_some() {
        writer.open("cols")?;
        for (col, width) in widths {
            writer.start_element("col")?;
            writer.attribute_int("min", i64::from(col) + 1)?;
            writer.attribute_int("max", i64::from(col) + 1)?;
            writer.attribute_num("width", width)?;
            writer.attribute("customWidth", "1")?;
            writer.close_empty()?;
        }
        writer.end_element("cols")?;
    }

    writer.open("sheetData")?;
    let mut row_number = itoa::Buffer::new();
    for (index, row) in sheet.rows() {
        let row_ref = row_number.format(index + 1);
        writer.start_element("row")?;
        writer.attribute("r", row_ref)?;
        writer.close_start_tag()?;
        for (col, cell) in row.cells().iter().enumerate() {
            write_cell(
                CellSlot::new(index, col as u32),
                cell,
                shared_strings,
                writer,
            )?;
        }
        writer.end_element("row")?;
    }
    writer.end_element("sheetData")?;

    if !sheet.merges().is_empty() {
        writer.start_element("mergeCells")?;
        writer.attribute_int("count", sheet.merges().len() as i64)?;
        writer.close_start_tag()?;
        for merge in sheet.merges() {
            writer.start_element("mergeCell")?;
            writer.attribute("ref", &merge.reference())?;
            writer.close_empty()?;
        }
        writer.end_element("mergeCells")?;
    }

    writer.end_element("worksheet")?;
    writer.flush()
}

fn dimension(sheet: &Worksheet) -> String {
    match (sheet.last_row_index(), sheet.max_column_count()) {
        (Some(last_row), columns) if columns > 0 => format!(
            "A1:{}{}",
            column_letter(columns as u32 - 1),
            last_row + 1
        ),
        _ => "A1".to_string(),
    }
}

fn write_cell<W: Write>(
    slot: CellSlot,
    cell: &Cell,
    shared_strings: &mut SharedStrings,
    writer: &mut XmlWriter<W>,
) -> Result<()> {
    if cell.value == CellData::Blank && cell.style.is_none() {
        return Ok(());
    }

    writer.start_element("c")?;
    writer.attribute("r", &slot.reference())?;
    if let Some(style) = cell.style {
        writer.attribute_int("s", i64::from(style.index()))?;
    }

    match &cell.value {
        CellData::Blank => writer.close_empty(),
        CellData::Text(text) => {
            let index = shared_strings.add_string(text);
            writer.attribute("t", "s")?;
            writer.close_start_tag()?;
            writer.text_element("v", itoa::Buffer::new().format(index))?;
            writer.end_element("c")
        }
        CellData::Number(n) if n.is_finite() => {
            writer.close_start_tag()?;
            writer.text_element("v", &n.to_string())?;
            writer.end_element("c")
        }
        CellData::Number(_) => {
            writer.attribute("t", "e")?;
            writer.close_start_tag()?;
            writer.text_element("v", "#NUM!")?;
            writer.end_element("c")
        }
        CellData::Boolean(b) => {
            writer.attribute("t", "b")?;
            writer.close_start_tag()?;
            writer.text_element("v", if *b { "1" } else { "0" })?;
            writer.end_element("c")
        }
        CellData::Error(code) => {
            writer.attribute("t", "e")?;
            writer.close_start_tag()?;
            writer.text_element("v", code)?;
            writer.end_element("c")
        }
        CellData::Formula { formula, cached } => {
            let (kind, value) = match cached.as_ref() {
                CellData::Text(text) => (Some("str"), Some(text.clone())),
                CellData::Number(n) if n.is_finite() => (None, Some(n.to_string())),
                CellData::Boolean(b) => (Some("b"), Some(if *b { "1" } else { "0" }.to_string())),
                CellData::Error(code) => (Some("e"), Some(code.clone())),
                _ => (None, None),
            };
            if let Some(kind) = kind {
                writer.attribute("t", kind)?;
            }
            writer.close_start_tag()?;
            writer.text_element("f", formula)?;
            if let Some(value) = value {
                writer.text_element("v", &value)?;
            }
            writer.end_element("c")
        }
    }
}
