use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{PdfError, Result};
use crate::graph::FontHandle;
use crate::positioning::PositionedGlyph;
use crate::writer::escape_literal;

/// How a font's glyphs are written inside a text-showing string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Two-byte glyph IDs in a hex string (Type0, Identity-H).
    Identity,
    /// One byte per character in a literal string (simple fonts).
    SingleByte,
}

/// One line of text placed at an absolute baseline position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// The text as the caller passed it.
    pub text: String,
    pub font: FontHandle,
    pub size: f64,
    pub x: f64,
    pub y: f64,
    /// Glyphs after fallback resolution, in drawing order.
    pub glyphs: Vec<PositionedGlyph>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentOp {
    Text(TextRun),
}

/// A page's drawing operations in call order. Later operations paint
/// over earlier ones.
#[derive(Debug, Clone, Default)]
pub struct ContentStream {
    ops: Vec<ContentOp>,
}

impl ContentStream {
    pub fn new() -> Self {
        ContentStream { ops: Vec::new() }
    }

    pub fn push_text(&mut self, run: TextRun) {
        self.ops.push(ContentOp::Text(run));
    }

    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.ops.iter().map(|op| match op {
            ContentOp::Text(run) => run,
        })
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Translate the operations into content-stream operator syntax.
    /// `lookup` maps a font handle to its page resource name and
    /// encoding; an unknown handle is a broken reference.
    pub fn encode<'a, F>(&self, lookup: F) -> Result<Vec<u8>>
    where
        F: Fn(FontHandle) -> Option<(&'a str, TextEncoding)>,
    {
        let mut out = Vec::new();
        for op in &self.ops {
            match op {
                ContentOp::Text(run) => {
                    let (resource, encoding) = lookup(run.font)
                        .ok_or_else(|| PdfError::broken(run.font, "font used in content stream"))?;
                    write_text_run(&mut out, run, resource, encoding);
                }
            }
        }
        Ok(out)
    }
}

/// `BT /Fn size Tf x y Td <string> Tj ET`. Each run opens a fresh text
/// object, so `Td` is relative to the origin and therefore absolute.
fn write_text_run(out: &mut Vec<u8>, run: &TextRun, resource: &str, encoding: TextEncoding) {
    out.extend_from_slice(b"BT\n");
    out.extend_from_slice(format!("/{} {} Tf\n", resource, format_coord(run.size)).as_bytes());
    out.extend_from_slice(format!("{} {} Td\n", format_coord(run.x), format_coord(run.y)).as_bytes());
    match encoding {
        TextEncoding::Identity => {
            out.push(b'<');
            for g in &run.glyphs {
                out.extend_from_slice(format!("{:04X}", g.glyph).as_bytes());
            }
            out.push(b'>');
        }
        TextEncoding::SingleByte => {
            let codes: Vec<u8> = run.glyphs.iter().map(|g| g.glyph as u8).collect();
            out.push(b'(');
            out.extend_from_slice(&escape_literal(&codes));
            out.push(b')');
        }
    }
    out.extend_from_slice(b" Tj\nET\n");
}

/// Deflate stream data for `/Filter /FlateDecode`.
pub fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Format a coordinate value for PDF content streams.
pub(crate) fn format_coord(v: f64) -> String {
    if v == v.floor() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.4}", v);
        let s = s.trim_end_matches('0');
        let s = s.trim_end_matches('.');
        s.to_string()
    }
}
