//! Package assembly: every part of an `.xlsx` zip

use std::io::{Seek, Write};
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use super::shared_strings::SharedStrings;
use super::styles::write_styles;
use super::worksheet::write_worksheet;
use super::xml_writer::XmlWriter;
use crate::document::Workbook;
use crate::error::{ExcelError, Result};

/// Deflate level used when none is configured
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 6;

const APPLICATION: &str = "sheetbind";

/// Write `workbook` as an `.xlsx` package into `writer`
///
/// Sheets are serialized in workbook order; shared strings are collected
/// while the sheets are written and stored last.
pub fn write_package<W: Write + Seek>(
    workbook: &Workbook,
    writer: W,
    compression_level: Option<i64>,
) -> Result<W> {
    if workbook.sheets().is_empty() {
        return Err(ExcelError::WriteError(
            "A workbook needs at least one sheet".to_string(),
        ));
    }

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(compression_level.unwrap_or(DEFAULT_COMPRESSION_LEVEL)));
    let mut zip = ZipWriter::new(writer);
    let sheet_count = workbook.sheets().len();

    zip.start_file("[Content_Types].xml", options)?;
    write_content_types(&mut zip, sheet_count)?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(ROOT_RELS.as_bytes())?;

    zip.start_file("docProps/core.xml", options)?;
    write_core_props(&mut zip)?;

    zip.start_file("docProps/app.xml", options)?;
    write_app_props(&mut zip, workbook)?;

    zip.start_file("xl/workbook.xml", options)?;
    write_workbook_xml(&mut zip, workbook)?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    write_workbook_rels(&mut zip, sheet_count)?;

    zip.start_file("xl/styles.xml", options)?;
    write_styles(workbook.styles(), &mut XmlWriter::new(&mut zip))?;

    let mut shared_strings = SharedStrings::new();
    for (i, sheet) in workbook.sheets().iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        write_worksheet(sheet, &mut shared_strings, &mut XmlWriter::new(&mut zip))?;
    }

    zip.start_file("xl/sharedStrings.xml", options)?;
    shared_strings.write_xml(&mut XmlWriter::new(&mut zip))?;

    log::debug!(
        "wrote package with {} sheets, {} shared strings",
        sheet_count,
        shared_strings.count()
    );
    Ok(zip.finish()?)
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

fn write_content_types<W: Write>(writer: &mut W, sheet_count: usize) -> Result<()> {
    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.write_str(
        "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>",
    )?;
    for i in 1..=sheet_count {
        xml.start_element("Override")?;
        xml.attribute("PartName", &format!("/xl/worksheets/sheet{}.xml", i))?;
        xml.attribute(
            "ContentType",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
        )?;
        xml.close_empty()?;
    }
    xml.write_str(
        "<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>\
         <Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>\
         <Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
         <Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>\
         </Types>",
    )?;
    xml.flush()
}

fn write_core_props<W: Write>(writer: &mut W) -> Result<()> {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.write_str(
        "<cp:coreProperties \
         xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
         xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">",
    )?;
    xml.text_element("dc:creator", APPLICATION)?;
    xml.text_element("cp:lastModifiedBy", APPLICATION)?;
    for name in ["dcterms:created", "dcterms:modified"] {
        xml.start_element(name)?;
        xml.attribute("xsi:type", "dcterms:W3CDTF")?;
        xml.close_start_tag()?;
        xml.write_str(&now)?;
        xml.end_element(name)?;
    }
    xml.end_element("cp:coreProperties")?;
    xml.flush()
}

fn write_app_props<W: Write>(writer: &mut W, workbook: &Workbook) -> Result<()> {
    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.start_element("Properties")?;
    xml.attribute(
        "xmlns",
        "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
    )?;
    xml.attribute(
        "xmlns:vt",
        "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes",
    )?;
    xml.close_start_tag()?;
    xml.text_element("Application", APPLICATION)?;

    let count = workbook.sheets().len() as i64;
    xml.write_str("<HeadingPairs><vt:vector size=\"2\" baseType=\"variant\">")?;
    xml.write_str("<vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant><vt:variant>")?;
    xml.text_element("vt:i4", &count.to_string())?;
    xml.write_str("</vt:variant></vt:vector></HeadingPairs>")?;

    xml.open("TitlesOfParts")?;
    xml.start_element("vt:vector")?;
    xml.attribute_int("size", count)?;
    xml.attribute("baseType", "lpstr")?;
    xml.close_start_tag()?;
    for sheet in workbook.sheets() {
        xml.text_element("vt:lpstr", sheet.name())?;
    }
    xml.end_element("vt:vector")?;
    xml.end_element("TitlesOfParts")?;

    xml.end_element("Properties")?;
    xml.flush()
}

fn write_workbook_xml<W: Write>(writer: &mut W, workbook: &Workbook) -> Result<()> {
    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.start_element("workbook")?;
    xml.attribute(
        "xmlns",
        "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
    )?;
    xml.attribute(
        "xmlns:r",
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
    )?;
    xml.close_start_tag()?;

    xml.open("sheets")?;
    for (i, sheet) in workbook.sheets().iter().enumerate() {
        let sheet_id = i + 1;
        xml.start_element("sheet")?;
        xml.attribute("name", sheet.name())?;
        xml.attribute_int("sheetId", sheet_id as i64)?;
        xml.attribute("r:id", &format!("rId{}", sheet_id))?;
        xml.close_empty()?;
    }
    xml.end_element("sheets")?;
    xml.end_element("workbook")?;
    xml.flush()
}

fn write_workbook_rels<W: Write>(writer: &mut W, sheet_count: usize) -> Result<()> {
    let mut xml = XmlWriter::new(writer);
    xml.declaration()?;
    xml.start_element("Relationships")?;
    xml.attribute(
        "xmlns",
        "http://schemas.openxmlformats.org/package/2006/relationships",
    )?;
    xml.close_start_tag()?;

    let mut relationship = |id: usize, kind: &str, target: &str| -> Result<()> {
        xml.start_element("Relationship")?;
        xml.attribute("Id", &format!("rId{}", id))?;
        xml.attribute(
            "Type",
            &format!(
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}",
                kind
            ),
        )?;
        xml.attribute("Target", target)?;
        xml.close_empty()
    };

    for i in 1..=sheet_count {
        relationship(i, "worksheet", &format!("worksheets/sheet{}.xml", i))?;
    }
    relationship(sheet_count + 1, "styles", "styles.xml")?;
    relationship(sheet_count + 2, "sharedStrings", "sharedStrings.xml")?;

    xml.end_element("Relationships")?;
    xml.flush()
}
