//! Buffered XML writer for package parts

use crate::error::Result;
use std::io::Write;

/// Bytes buffered before they are pushed to the underlying writer
const FLUSH_THRESHOLD: usize = 16 * 1024;

/// XML declaration every part starts with
const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// Minimal XML writer: tags, attributes and escaped text
///
/// Element names and attribute names are written as given; only attribute
/// values and text content are escaped.
pub struct XmlWriter<W: Write> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(writer: W) -> Self {
        XmlWriter {
            writer,
            buffer: Vec::with_capacity(FLUSH_THRESHOLD * 2),
        }
    }

    /// Write the XML declaration
    pub fn declaration(&mut self) -> Result<()> {
        self.write_str(DECLARATION)
    }

    /// Write raw bytes
    #[inline]
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        self.flush_if_full()
    }

    /// Write a string without escaping
    #[inline]
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_raw(s.as_bytes())
    }

    /// Open a start tag; attributes may follow
    #[inline]
    pub fn start_element(&mut self, name: &str) -> Result<()> {
        self.buffer.push(b'<');
        self.write_str(name)
    }

    /// Finish a start tag opened with [`start_element`](Self::start_element)
    #[inline]
    pub fn close_start_tag(&mut self) -> Result<()> {
        self.write_raw(b">")
    }

    /// Finish a start tag as a self-closing element
    #[inline]
    pub fn close_empty(&mut self) -> Result<()> {
        self.write_raw(b"/>")
    }

    /// Write an end tag
    #[inline]
    pub fn end_element(&mut self, name: &str) -> Result<()> {
        self.write_raw(b"</")?;
        self.write_str(name)?;
        self.write_raw(b">")
    }

    /// Write `<name>` with no attributes
    #[inline]
    pub fn open(&mut self, name: &str) -> Result<()> {
        self.start_element(name)?;
        self.close_start_tag()
    }

    /// Write `<name>text</name>`
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.open(name)?;
        self.write_escaped(text)?;
        self.end_element(name)
    }

    /// Write a string attribute
    #[inline]
    pub fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.attribute_prefix(name);
        self.write_escaped(value)?;
        self.write_raw(b"\"")
    }

    /// Write an integer attribute
    #[inline]
    pub fn attribute_int(&mut self, name: &str, value: i64) -> Result<()> {
        self.attribute_prefix(name);
        let mut digits = itoa::Buffer::new();
        self.buffer.extend_from_slice(digits.format(value).as_bytes());
        self.write_raw(b"\"")
    }

    /// Write a floating point attribute
    #[inline]
    pub fn attribute_num(&mut self, name: &str, value: f64) -> Result<()> {
        self.attribute_prefix(name);
        self.buffer.extend_from_slice(value.to_string().as_bytes());
        self.write_raw(b"\"")
    }

    fn attribute_prefix(&mut self, name: &str) {
        self.buffer.push(b' ');
        self.buffer.extend_from_slice(name.as_bytes());
        self.buffer.extend_from_slice(b"=\"");
    }

    /// Write text content with XML escaping
    ///
    /// Control characters other than tab, newline and carriage return are not
    /// allowed in XML 1.0 and are dropped.
    pub fn write_escaped(&mut self, text: &str) -> Result<()> {
        for byte in text.bytes() {
            match byte {
                b'&' => self.buffer.extend_from_slice(b"&amp;"),
                b'<' => self.buffer.extend_from_slice(b"&lt;"),
                b'>' => self.buffer.extend_from_slice(b"&gt;"),
                b'"' => self.buffer.extend_from_slice(b"&quot;"),
                b'\'' => self.buffer.extend_from_slice(b"&apos;"),
                b'\t' | b'\n' | b'\r' => self.buffer.push(byte),
                0..=0x1f => {}
                _ => self.buffer.push(byte),
            }
        }
        self.flush_if_full()
    }

    #[inline]
    fn flush_if_full(&mut self) -> Result<()> {
        if self.buffer.len() > FLUSH_THRESHOLD {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    /// Flush buffered bytes to the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        self.writer.flush()?;
        Ok(())
    }
}
