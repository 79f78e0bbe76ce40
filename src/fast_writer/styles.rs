//! `xl/styles.xml` from a workbook's style table

use super::xml_writer::XmlWriter;
use crate::document::StyleTable;
use crate::error::Result;
use std::io::Write;

/// Write the style sheet: number formats, fonts and one `xf` per cell format
pub fn write_styles<W: Write>(styles: &StyleTable, writer: &mut XmlWriter<W>) -> Result<()> {
    writer.declaration()?;
    writer.start_element("styleSheet")?;
    writer.attribute(
        "xmlns",
        "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
    )?;
    writer.close_start_tag()?;

    let num_fmts = styles.custom_number_formats();
    writer.start_element("numFmts")?;
    writer.attribute_int("count", num_fmts.len() as i64)?;
    if num_fmts.is_empty() {
        writer.close_empty()?;
    } else {
        writer.close_start_tag()?;
        for (id, code) in num_fmts {
            writer.start_element("numFmt")?;
            writer.attribute_int("numFmtId", i64::from(*id))?;
            writer.attribute("formatCode", code)?;
            writer.close_empty()?;
        }
        writer.end_element("numFmts")?;
    }

    writer.start_element("fonts")?;
    writer.attribute_int("count", styles.fonts().len() as i64)?;
    writer.close_start_tag()?;
    for font in styles.fonts() {
        writer.open("font")?;
        if font.bold {
            writer.write_str("<b/>")?;
        }
        writer.start_element("sz")?;
        writer.attribute_num("val", font.size)?;
        writer.close_empty()?;
        writer.start_element("name")?;
        writer.attribute("val", &font.name)?;
        writer.close_empty()?;
        writer.end_element("font")?;
    }
    writer.end_element("fonts")?;

    // fills 0 and 1 are reserved by the format
    writer.write_str(concat!(
        "<fills count=\"2\">",
        "<fill><patternFill patternType=\"none\"/></fill>",
        "<fill><patternFill patternType=\"gray125\"/></fill>",
        "</fills>",
        "<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>",
        "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
    ))?;

    let formats = styles.cell_formats();
    writer.start_element("cellXfs")?;
    writer.attribute_int("count", formats.len() as i64)?;
    writer.close_start_tag()?;
    for format in formats {
        writer.start_element("xf")?;
        writer.attribute_int("numFmtId", i64::from(format.num_fmt_id))?;
        writer.attribute_int("fontId", format.font_id as i64)?;
        writer.write_str(" fillId=\"0\" borderId=\"0\" xfId=\"0\"")?;
        if format.num_fmt_id != 0 {
            writer.attribute("applyNumberFormat", "1")?;
        }
        if format.font_id != 0 {
            writer.attribute("applyFont", "1")?;
        }
        match format.align {
            Some(align) => {
                writer.attribute("applyAlignment", "1")?;
                writer.close_start_tag()?;
                writer.start_element("alignment")?;
                writer.attribute("horizontal", align.as_str())?;
                writer.close_empty()?;
                writer.end_element("xf")?;
            }
            None => writer.close_empty()?,
        }
    }
    writer.end_element("cellXfs")?;

    writer.write_str(
        "<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>",
    )?;
    writer.end_element("styleSheet")?;
    writer.flush()
}
