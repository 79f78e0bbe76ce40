//! Shared strings table

use super::xml_writer::XmlWriter;
use crate::error::Result;
use indexmap::IndexSet;
use std::io::Write;

/// Deduplicated text of every string cell in the workbook
///
/// Cells refer to their text by position in the table.
#[derive(Debug, Default)]
pub struct SharedStrings {
    strings: IndexSet<String>,
    references: usize,
}

impl SharedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string and get its index
    pub fn add_string(&mut self, s: &str) -> u32 {
        self.references += 1;
        if let Some(index) = self.strings.get_index_of(s) {
            return index as u32;
        }
        self.strings.insert_full(s.to_string()).0 as u32
    }

    /// Number of unique strings
    pub fn count(&self) -> usize {
        self.strings.len()
    }

    /// Number of cells referring to the table
    pub fn references(&self) -> usize {
        self.references
    }

    /// Write `xl/sharedStrings.xml`
    pub fn write_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.declaration()?;
        writer.start_element("sst")?;
        writer.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        writer.attribute_int("count", self.references as i64)?;
        writer.attribute_int("uniqueCount", self.strings.len() as i64)?;
        writer.close_start_tag()?;

        for s in &self.strings {
            writer.open("si")?;
            writer.start_element("t")?;
            if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
                writer.attribute("xml:space", "preserve")?;
            }
            writer.close_start_tag()?;
            writer.write_escaped(s)?;
            writer.end_element("t")?;
            writer.end_element("si")?;
        }

        writer.end_element("sst")?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_strings() {
        let mut ss = SharedStrings::new();

        assert_eq!(ss.add_string("Hello"), 0);
        assert_eq!(ss.add_string("World"), 1);
        assert_eq!(ss.add_string("Hello"), 0);
        assert_eq!(ss.count(), 2);
        assert_eq!(ss.references(), 3);
    }

    #[test]
    fn test_whitespace_preserved() {
        let mut ss = SharedStrings::new();
        ss.add_string(" padded");
        ss.add_string("");

        let mut output = Vec::new();
        {
            let mut writer = XmlWriter::new(&mut output);
            ss.write_xml(&mut writer).unwrap();
        }
        let xml = String::from_utf8(output).unwrap();
        assert!(xml.contains("<si><t xml:space=\"preserve\"> padded</t></si>"));
        assert!(xml.contains("<si><t></t></si>"));
        assert!(xml.contains("count=\"2\" uniqueCount=\"2\""));
    }
}
