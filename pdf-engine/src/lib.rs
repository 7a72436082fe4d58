pub mod error;
pub mod objects;
pub mod writer;
pub mod truetype;
pub mod fonts;
pub mod positioning;
pub mod graph;
pub mod content;
pub mod page;
pub mod metadata;
pub mod compliance;
pub mod document;
pub mod reader;
mod serializer;

pub use compliance::{ComplianceMode, Violation};
pub use document::{Document, DocumentOptions, DocumentState, Font, FontKind};
pub use error::{PdfError, Result};
pub use fonts::BuiltinFont;
pub use graph::{FontHandle, PageHandle};
pub use metadata::{DocumentInfo, OutputIntent};
pub use objects::{ObjId, PdfObject};
pub use page::{Page, PageSize};
pub use positioning::{FallbackPolicy, GlyphSource, PositionedGlyph, Resolution};
pub use reader::{PdfReadError, PdfReader, TextOp};
pub use truetype::{FontProgram, LoadOptions, OutlineFormat};
