use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::objects::{ObjId, PdfObject};

/// Low-level PDF binary writer. Serializes PDF objects to any
/// `Write` target while tracking byte offsets for the xref table.
pub struct PdfWriter<W: Write> {
    writer: W,
    offset: usize,
    xref_entries: BTreeMap<u32, usize>,
}

/// Trailer fields beyond `/Size`.
#[derive(Debug, Clone, Copy)]
pub struct Trailer {
    pub root: ObjId,
    pub info: Option<ObjId>,
    /// File identifier, written twice as `/ID [<id> <id>]`.
    pub file_id: Option<[u8; 16]>,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(writer: W) -> Self {
        PdfWriter {
            writer,
            offset: 0,
            xref_entries: BTreeMap::new(),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.offset += data.len();
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Write the `%PDF-x.y` header and the binary comment line.
    pub fn write_header(&mut self, version: &str) -> io::Result<()> {
        self.write_str(&format!("%PDF-{}\n", version))?;
        // Four bytes >= 128 mark the file as binary.
        self.write_bytes(b"%\xe2\xe3\xcf\xd3\n")?;
        Ok(())
    }

    /// Write an indirect object, recording its byte offset for xref.
    pub fn write_object(&mut self, id: ObjId, obj: &PdfObject) -> io::Result<()> {
        self.xref_entries.insert(id.0, self.offset);
        log::trace!("object {} at offset {}", id.0, self.offset);
        self.write_str(&format!("{} {} obj\n", id.0, id.1))?;
        self.write_pdf_object(obj)?;
        self.write_str("\nendobj\n")?;
        Ok(())
    }

    fn write_dict_entries(&mut self, entries: &[(String, PdfObject)]) -> io::Result<()> {
        for (key, val) in entries {
            self.write_str(" /")?;
            self.write_str(key)?;
            self.write_str(" ")?;
            self.write_pdf_object(val)?;
        }
        Ok(())
    }

    fn write_pdf_object(&mut self, obj: &PdfObject) -> io::Result<()> {
        match obj {
            PdfObject::Null => self.write_str("null"),
            PdfObject::Boolean(b) => self.write_str(if *b { "true" } else { "false" }),
            PdfObject::Integer(n) => self.write_str(&n.to_string()),
            PdfObject::Real(f) => self.write_str(&format_real(*f)),
            PdfObject::Name(name) => {
                self.write_str("/")?;
                self.write_str(name)
            }
            PdfObject::LiteralString(s) => {
                self.write_str("(")?;
                self.write_bytes(&escape_literal(s.as_bytes()))?;
                self.write_str(")")
            }
            PdfObject::HexString(bytes) => {
                self.write_str("<")?;
                self.write_str(&hex_upper(bytes))?;
                self.write_str(">")
            }
            PdfObject::Array(items) => {
                self.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write_str(" ")?;
                    }
                    self.write_pdf_object(item)?;
                }
                self.write_str("]")
            }
            PdfObject::Dictionary(entries) => {
                self.write_str("<<")?;
                self.write_dict_entries(entries)?;
                self.write_str(" >>")
            }
            PdfObject::Stream { dict, data } => {
                self.write_str("<<")?;
                self.write_dict_entries(dict)?;
                self.write_str(" /Length ")?;
                self.write_str(&data.len().to_string())?;
                self.write_str(" >>\nstream\n")?;
                self.write_bytes(data)?;
                self.write_str("\nendstream")
            }
            PdfObject::Reference(id) => self.write_str(&id.to_string()),
        }
    }

    /// Current byte offset in the output.
    pub fn current_offset(&self) -> usize {
        self.offset
    }

    /// Byte offset recorded for an object, if it was written.
    pub fn offset_of(&self, id: ObjId) -> Option<usize> {
        self.xref_entries.get(&id.0).copied()
    }

    /// Write xref table, trailer, startxref, and %%EOF.
    pub fn write_xref_and_trailer(&mut self, trailer: &Trailer) -> io::Result<()> {
        let xref_offset = self.offset;
        let max_obj = self.xref_entries.keys().next_back().copied().unwrap_or(0);
        let size = max_obj + 1;

        self.write_str("xref\n")?;
        self.write_str(&format!("0 {}\n", size))?;
        // Object 0: head of the free list. Every entry is exactly 20 bytes.
        self.write_bytes(b"0000000000 65535 f\r\n")?;
        for obj_num in 1..size {
            let entry = match self.xref_entries.get(&obj_num) {
                Some(&off) => format!("{:010} {:05} n\r\n", off, 0),
                None => "0000000000 00000 f\r\n".to_string(),
            };
            self.write_str(&entry)?;
        }

        self.write_str("trailer\n")?;
        self.write_str(&format!("<< /Size {} /Root {}", size, trailer.root))?;
        if let Some(info) = trailer.info {
            self.write_str(&format!(" /Info {}", info))?;
        }
        if let Some(file_id) = trailer.file_id {
            let hex = hex_upper(&file_id);
            self.write_str(&format!(" /ID [<{}> <{}>]", hex, hex))?;
        }
        self.write_str(" >>\n")?;

        self.write_str("startxref\n")?;
        self.write_str(&format!("{}\n", xref_offset))?;
        self.write_str("%%EOF\n")?;
        self.writer.flush()
    }

    /// Return the inner writer, consuming this PdfWriter.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Escape special characters in a PDF literal string.
pub fn escape_pdf_string(s: &str) -> String {
    String::from_utf8_lossy(&escape_literal(s.as_bytes())).into_owned()
}

/// Byte-level escaping for literal strings whose content is already
/// encoded (e.g. WinAnsi codes from a builtin font).
pub fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'(' => out.extend_from_slice(b"\\("),
            b')' => out.extend_from_slice(b"\\)"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\n' => out.extend_from_slice(b"\\n"),
            _ => out.push(b),
        }
    }
    out
}

/// Encode a text string: plain ASCII stays a literal, anything else
/// becomes UTF-16BE with a byte order mark.
pub fn text_string(s: &str) -> PdfObject {
    if s.is_ascii() {
        return PdfObject::literal_string(s);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    PdfObject::HexString(bytes)
}

pub(crate) fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Format a float for PDF output: no trailing zeros,
/// no scientific notation.
fn format_real(f: f64) -> String {
    if f == f.floor() && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        let s = format!("{:.6}", f);
        let s = s.trim_end_matches('0');
        let s = s.trim_end_matches('.');
        s.to_string()
    }
}
