use std::fmt;
use std::io::Write;

use crate::document::{Document, FontKind};
use crate::error::PdfError;
use crate::objects::ObjId;
use crate::truetype::OutlineFormat;

/// Validation profile a document is written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComplianceMode {
    /// Plain PDF 1.7, nothing checked.
    #[default]
    None,
    /// PDF/A-1B (ISO 19005-1, level B): visual reproducibility.
    PdfA1b,
}

impl ComplianceMode {
    /// Header version for the mode.
    pub fn pdf_version(&self) -> &'static str {
        match self {
            ComplianceMode::None => "1.7",
            ComplianceMode::PdfA1b => "1.4",
        }
    }

    pub fn is_restricted(&self) -> bool {
        *self != ComplianceMode::None
    }
}

/// One rule the document breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Object the problem was found in, when there is one.
    pub object: Option<ObjId>,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object {
            Some(id) => write!(f, "{} (object {})", self.message, id),
            None => f.write_str(&self.message),
        }
    }
}

impl From<Violation> for PdfError {
    fn from(v: Violation) -> Self {
        PdfError::violation(v.object, v.message)
    }
}

/// Collect every violation of the document's compliance mode. Returns
/// nothing for [`ComplianceMode::None`].
pub fn validate<W: Write>(doc: &Document<W>) -> Vec<Violation> {
    match doc.options().compliance {
        ComplianceMode::None => Vec::new(),
        ComplianceMode::PdfA1b => validate_pdfa1b(doc),
    }
}

fn validate_pdfa1b<W: Write>(doc: &Document<W>) -> Vec<Violation> {
    let mut violations = Vec::new();

    for font in doc.fonts() {
        let object = Some(font.object_id());
        match font.kind() {
            FontKind::Builtin(builtin) => violations.push(Violation {
                object,
                message: format!(
                    "font {} ({}) is not embedded",
                    font.resource_name(),
                    builtin.base_name()
                ),
            }),
            FontKind::TrueType(program) if program.outline() == OutlineFormat::Cff => {
                violations.push(Violation {
                    object,
                    message: format!(
                        "font {} ({}) has CFF outlines, which PDF 1.4 cannot embed",
                        font.resource_name(),
                        program.postscript_name()
                    ),
                })
            }
            FontKind::TrueType(_) => {}
        }
    }

    for page in doc.pages() {
        for run in page.content().text_runs() {
            for glyph in run.glyphs.iter().filter(|g| !g.is_defined()) {
                violations.push(Violation {
                    object: Some(page.object_id()),
                    message: format!(
                        "undefined glyph for codepoint U+{:04X}",
                        glyph.codepoint as u32
                    ),
                });
            }
        }
    }

    let info = doc.info();
    let info_id = Some(doc.info_id());
    if info.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
        violations.push(Violation {
            object: info_id,
            message: "document title is missing".to_string(),
        });
    }
    if info.creation_date.is_none() {
        violations.push(Violation {
            object: info_id,
            message: "document creation date is missing".to_string(),
        });
    }

    match doc.output_intent() {
        None => violations.push(Violation {
            object: Some(doc.catalog_id()),
            message: "output intent with an ICC color profile is missing".to_string(),
        }),
        Some(intent) if intent.icc_major_version > 2 => violations.push(Violation {
            object: Some(doc.catalog_id()),
            message: format!(
                "ICC profile version {} is newer than PDF 1.4 supports",
                intent.icc_major_version
            ),
        }),
        Some(_) => {}
    }

    violations
}
