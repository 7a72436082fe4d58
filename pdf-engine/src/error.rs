use std::io;

use thiserror::Error;

use crate::objects::ObjId;

/// Errors raised while building or serializing a document.
#[derive(Error, Debug)]
pub enum PdfError {
    /// The font bytes could not be parsed, a required table is missing,
    /// or a table checksum does not match its directory record.
    #[error("malformed font: {0}")]
    MalformedFont(String),

    /// A reference points at an object or handle that is not part of
    /// the document graph.
    #[error("broken reference to {id} ({context})")]
    BrokenReference { id: String, context: String },

    /// The document breaks a rule of its declared compliance mode.
    #[error("compliance violation{}: {message}", fmt_object(.object))]
    ComplianceViolation {
        object: Option<ObjId>,
        message: String,
    },

    /// `complete()` was already called, or the document was closed by
    /// an earlier failure.
    #[error("document already finalized")]
    AlreadyFinalized,

    /// Writing to the output sink failed. The sink holds a partial file.
    #[error("sink I/O error: {0}")]
    SinkIo(#[from] io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, PdfError>;

impl PdfError {
    pub(crate) fn broken(id: impl ToString, context: impl Into<String>) -> Self {
        PdfError::BrokenReference {
            id: id.to_string(),
            context: context.into(),
        }
    }

    pub(crate) fn violation(object: Option<ObjId>, message: impl Into<String>) -> Self {
        PdfError::ComplianceViolation {
            object,
            message: message.into(),
        }
    }
}

fn fmt_object(object: &Option<ObjId>) -> String {
    match object {
        Some(id) => format!(" in object {}", id),
        None => String::new(),
    }
}
