use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, FixedOffset, Local};

use crate::compliance::{self, ComplianceMode, Violation};
use crate::content::{TextEncoding, TextRun};
use crate::error::{PdfError, Result};
use crate::fonts::BuiltinFont;
use crate::graph::{FontHandle, NodeKind, ObjectGraph, PageHandle};
use crate::metadata::{DocumentInfo, OutputIntent};
use crate::objects::ObjId;
use crate::page::{Page, PageSize};
use crate::positioning::{self, FallbackPolicy, GlyphSource, Resolution};
use crate::serializer;
use crate::truetype::FontProgram;

const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Document-wide settings, fixed when the document is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentOptions {
    pub compliance: ComplianceMode,
    /// Applied at draw time to characters a font cannot map.
    pub fallback: FallbackPolicy,
    /// Deflate content streams and embedded font programs.
    pub compress: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        DocumentOptions {
            compliance: ComplianceMode::None,
            fallback: FallbackPolicy::default(),
            compress: true,
        }
    }
}

impl DocumentOptions {
    /// Defaults with PDF/A-1B validation switched on.
    pub fn pdfa1b() -> Self {
        DocumentOptions {
            compliance: ComplianceMode::PdfA1b,
            ..Default::default()
        }
    }

    pub fn with_compliance(mut self, compliance: ComplianceMode) -> Self {
        self.compliance = compliance;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// Where a document is in its lifecycle. `Validating` is skipped when
/// the compliance mode is `None`; any failure ends in `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Open,
    Validating,
    Writing,
    Closed,
}

/// The program behind a font.
#[derive(Debug, Clone)]
pub enum FontKind {
    TrueType(FontProgram),
    Builtin(BuiltinFont),
}

impl FontKind {
    pub(crate) fn source(&self) -> &dyn GlyphSource {
        match self {
            FontKind::TrueType(program) => program,
            FontKind::Builtin(builtin) => builtin,
        }
    }

    pub(crate) fn encoding(&self) -> TextEncoding {
        match self {
            FontKind::TrueType(_) => TextEncoding::Identity,
            FontKind::Builtin(_) => TextEncoding::SingleByte,
        }
    }
}

/// Object ids belonging to one font.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FontObjects {
    pub font: ObjId,
    pub descendant: Option<ObjId>,
    pub descriptor: Option<ObjId>,
    pub file: Option<ObjId>,
    pub to_unicode: Option<ObjId>,
}

/// A font attached to a document.
#[derive(Debug, Clone)]
pub struct Font {
    kind: FontKind,
    resource: String,
    size: f64,
    used: BTreeSet<u16>,
    pub(crate) objects: FontObjects,
}

impl Font {
    pub fn kind(&self) -> &FontKind {
        &self.kind
    }

    /// Page resource name, e.g. `F1`.
    pub fn resource_name(&self) -> &str {
        &self.resource
    }

    /// Size applied to the next `draw_text` call.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Id of the font dictionary pages refer to.
    pub fn object_id(&self) -> ObjId {
        self.objects.font
    }

    /// Glyphs placed so far, used for `/W` and the ToUnicode map.
    pub fn used_glyphs(&self) -> &BTreeSet<u16> {
        &self.used
    }
}

/// A PDF document under construction.
///
/// Generic over `Write` so it works with files (`BufWriter<File>`),
/// in-memory buffers (`Vec<u8>`), or any other sink. Nothing reaches
/// the sink before [`Document::complete`]; a document that fails
/// validation writes zero bytes.
///
/// A `Document` has a single owner. Builders on several threads must
/// share it behind a `Mutex`; fonts can be parsed in parallel with
/// [`FontProgram::parse`] and attached afterwards.
pub struct Document<W: Write> {
    sink: W,
    options: DocumentOptions,
    state: DocumentState,
    graph: ObjectGraph,
    catalog_id: ObjId,
    pages_id: ObjId,
    info_id: ObjId,
    metadata_id: Option<ObjId>,
    icc_id: Option<ObjId>,
    info: DocumentInfo,
    output_intent: Option<OutputIntent>,
    fonts: Vec<Font>,
    pages: Vec<Page>,
}

impl Document<BufWriter<File>> {
    /// Create a document that writes to a file when completed.
    pub fn create<P: AsRef<Path>>(path: P, options: DocumentOptions) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), options))
    }
}

impl<W: Write> Document<W> {
    /// Start a document. The creation date defaults to now.
    pub fn new(sink: W, options: DocumentOptions) -> Self {
        let mut graph = ObjectGraph::new();
        let catalog_id = graph.allocate(NodeKind::Catalog);
        let pages_id = graph.allocate(NodeKind::PageTree);
        let info_id = graph.allocate(NodeKind::Info);
        let metadata_id = options
            .compliance
            .is_restricted()
            .then(|| graph.allocate(NodeKind::Metadata));
        log::debug!("new document, compliance {:?}", options.compliance);

        Document {
            sink,
            options,
            state: DocumentState::Open,
            graph,
            catalog_id,
            pages_id,
            info_id,
            metadata_id,
            icc_id: None,
            info: DocumentInfo {
                creation_date: Some(Local::now().fixed_offset()),
                ..Default::default()
            },
            output_intent: None,
            fonts: Vec::new(),
            pages: Vec::new(),
        }
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn is_finalized(&self) -> bool {
        self.state != DocumentState::Open
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == DocumentState::Open {
            Ok(())
        } else {
            Err(PdfError::AlreadyFinalized)
        }
    }

    // ── Fonts ───────────────────────────────────────────────────────────

    /// Parse TrueType/OpenType bytes and attach the font. A malformed
    /// font is reported before the document changes.
    pub fn load_font(&mut self, data: Vec<u8>) -> Result<FontHandle> {
        self.ensure_open()?;
        let program = FontProgram::parse(data)?;
        self.add_font_program(program)
    }

    /// Read a font file fully into memory and attach it.
    pub fn load_font_file<P: AsRef<Path>>(&mut self, path: P) -> Result<FontHandle> {
        self.ensure_open()?;
        let program = FontProgram::open(path)?;
        self.add_font_program(program)
    }

    /// Attach an already parsed font program; it is embedded in full.
    pub fn add_font_program(&mut self, program: FontProgram) -> Result<FontHandle> {
        self.ensure_open()?;
        let handle = FontHandle(self.fonts.len());
        let objects = FontObjects {
            font: self.graph.allocate(NodeKind::Type0Font(handle)),
            descendant: Some(self.graph.allocate(NodeKind::CidFont(handle))),
            descriptor: Some(self.graph.allocate(NodeKind::FontDescriptor(handle))),
            file: Some(self.graph.allocate(NodeKind::FontFile(handle))),
            to_unicode: Some(self.graph.allocate(NodeKind::ToUnicode(handle))),
        };
        log::debug!("attached {} as {}", program.postscript_name(), handle);
        self.push_font(FontKind::TrueType(program), objects);
        Ok(handle)
    }

    /// Attach a standard font. It is referenced by name, not embedded.
    pub fn add_builtin_font(&mut self, font: BuiltinFont) -> Result<FontHandle> {
        self.ensure_open()?;
        let handle = FontHandle(self.fonts.len());
        let objects = FontObjects {
            font: self.graph.allocate(NodeKind::SimpleFont(handle)),
            descendant: None,
            descriptor: None,
            file: None,
            to_unicode: None,
        };
        self.push_font(FontKind::Builtin(font), objects);
        Ok(handle)
    }

    fn push_font(&mut self, kind: FontKind, objects: FontObjects) {
        let resource = format!("F{}", self.fonts.len() + 1);
        self.fonts.push(Font {
            kind,
            resource,
            size: DEFAULT_FONT_SIZE,
            used: BTreeSet::new(),
            objects,
        });
    }

    pub fn font(&self, handle: FontHandle) -> Option<&Font> {
        self.fonts.get(handle.0)
    }

    pub fn fonts(&self) -> impl Iterator<Item = &Font> {
        self.fonts.iter()
    }

    fn font_checked(&self, handle: FontHandle) -> Result<&Font> {
        self.fonts
            .get(handle.0)
            .ok_or_else(|| PdfError::broken(handle, "font handle not issued by this document"))
    }

    /// Set the size used by subsequent `draw_text` and `measure` calls.
    /// Text already drawn keeps its size.
    pub fn set_font_size(&mut self, handle: FontHandle, size: f64) -> Result<()> {
        self.ensure_open()?;
        if !(size.is_finite() && size > 0.0) {
            return Err(PdfError::InvalidArgument(format!("font size {}", size)));
        }
        self.font_checked(handle)?;
        self.fonts[handle.0].size = size;
        Ok(())
    }

    pub fn font_size(&self, handle: FontHandle) -> Result<f64> {
        Ok(self.font_checked(handle)?.size)
    }

    /// Width of `text` in points at the font's current size, with the
    /// document's fallback policy applied.
    pub fn measure(&self, handle: FontHandle, text: &str) -> Result<f64> {
        let font = self.font_checked(handle)?;
        Ok(positioning::measure(
            font.kind.source(),
            text,
            font.size,
            self.options.fallback,
        ))
    }

    /// Baseline-to-baseline distance at the font's current size.
    pub fn line_height(&self, handle: FontHandle) -> Result<f64> {
        let font = self.font_checked(handle)?;
        Ok(font.kind.source().line_height(font.size))
    }

    // ── Pages and text ──────────────────────────────────────────────────

    pub fn add_page(&mut self, size: PageSize) -> Result<PageHandle> {
        self.ensure_open()?;
        if !(size.width.is_finite() && size.height.is_finite())
            || size.width <= 0.0
            || size.height <= 0.0
        {
            return Err(PdfError::InvalidArgument(format!(
                "page size {} x {}",
                size.width, size.height
            )));
        }
        let handle = PageHandle(self.pages.len());
        let page_id = self.graph.allocate(NodeKind::Page(handle));
        let content_id = self.graph.allocate(NodeKind::Contents(handle));
        self.pages.push(Page {
            size,
            content: Default::default(),
            page_id,
            content_id,
        });
        Ok(handle)
    }

    pub fn page(&self, handle: PageHandle) -> Option<&Page> {
        self.pages.get(handle.0)
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Place one line of text with its baseline starting at (x, y),
    /// using the font's current size. Coordinates use PDF's bottom-left
    /// origin and are absolute; nothing flows or wraps.
    pub fn draw_text(
        &mut self,
        page: PageHandle,
        font: FontHandle,
        text: &str,
        x: f64,
        y: f64,
    ) -> Result<()> {
        self.ensure_open()?;
        if !(x.is_finite() && y.is_finite()) {
            return Err(PdfError::InvalidArgument(format!("position ({}, {})", x, y)));
        }
        if page.0 >= self.pages.len() {
            return Err(PdfError::broken(page, "page handle not issued by this document"));
        }
        let entry = self.font_checked(font)?;

        let glyphs: Vec<_> =
            positioning::positions(entry.kind.source(), text, self.options.fallback).collect();
        let replaced = glyphs
            .iter()
            .filter(|g| g.resolution != Resolution::Mapped)
            .count();
        let omitted = text.chars().count() - glyphs.len();
        if replaced + omitted > 0 {
            log::warn!(
                "{}: {} character(s) without a glyph in {} ({:?})",
                page,
                replaced + omitted,
                entry.resource,
                self.options.fallback
            );
        }

        let run = TextRun {
            text: text.to_string(),
            font,
            size: entry.size,
            x,
            y,
            glyphs,
        };
        let entry = &mut self.fonts[font.0];
        entry.used.extend(run.glyphs.iter().map(|g| g.glyph));
        self.pages[page.0].content.push_text(run);
        Ok(())
    }

    // ── Metadata ────────────────────────────────────────────────────────

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    /// Replace all document information at once.
    pub fn set_info(&mut self, info: DocumentInfo) -> Result<&mut Self> {
        self.ensure_open()?;
        self.info = info;
        Ok(self)
    }

    pub fn set_title(&mut self, title: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        self.info.title = Some(title.to_string());
        Ok(self)
    }

    pub fn set_author(&mut self, author: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        self.info.author = Some(author.to_string());
        Ok(self)
    }

    pub fn set_subject(&mut self, subject: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        self.info.subject = Some(subject.to_string());
        Ok(self)
    }

    pub fn set_creator(&mut self, creator: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        self.info.creator = Some(creator.to_string());
        Ok(self)
    }

    pub fn set_producer(&mut self, producer: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        self.info.producer = producer.to_string();
        Ok(self)
    }

    /// `None` removes the date; PDF/A documents then fail validation.
    pub fn set_creation_date(&mut self, date: Option<DateTime<FixedOffset>>) -> Result<&mut Self> {
        self.ensure_open()?;
        self.info.creation_date = date;
        Ok(self)
    }

    pub fn output_intent(&self) -> Option<&OutputIntent> {
        self.output_intent.as_ref()
    }

    /// Declare the output color profile. Setting it again replaces the
    /// profile but keeps its object id.
    pub fn set_output_intent(&mut self, intent: OutputIntent) -> Result<()> {
        self.ensure_open()?;
        if self.icc_id.is_none() {
            self.icc_id = Some(self.graph.allocate(NodeKind::IccProfile));
        }
        self.output_intent = Some(intent);
        Ok(())
    }

    // ── Ids used by the serializer and validator ────────────────────────

    pub(crate) fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    pub(crate) fn catalog_id(&self) -> ObjId {
        self.catalog_id
    }

    pub(crate) fn pages_id(&self) -> ObjId {
        self.pages_id
    }

    pub(crate) fn info_id(&self) -> ObjId {
        self.info_id
    }

    pub(crate) fn metadata_id(&self) -> Option<ObjId> {
        self.metadata_id
    }

    pub(crate) fn icc_id(&self) -> Option<ObjId> {
        self.icc_id
    }

    /// Resource name and encoding for a font, as the content stream
    /// writer needs them.
    pub(crate) fn font_resource(&self, handle: FontHandle) -> Option<(&str, TextEncoding)> {
        self.fonts
            .get(handle.0)
            .map(|f| (f.resource.as_str(), f.kind.encoding()))
    }

    // ── Finalization ────────────────────────────────────────────────────

    /// Every rule the document currently breaks under its compliance
    /// mode. Empty when the mode is `None`.
    pub fn validate(&self) -> Vec<Violation> {
        compliance::validate(self)
    }

    /// Validate (in restricted modes), then write the whole document to
    /// the sink. May be called once; afterwards the document is closed
    /// whether or not writing succeeded.
    ///
    /// A validation failure leaves the sink untouched. A sink error
    /// leaves it holding a partial file that must be discarded.
    pub fn complete(&mut self) -> Result<()> {
        self.ensure_open()?;
        let result = self.finish();
        self.state = DocumentState::Closed;
        match &result {
            Ok(()) => log::debug!("document complete: {} objects", self.graph.len()),
            Err(e) => log::debug!("document failed: {}", e),
        }
        result
    }

    fn finish(&mut self) -> Result<()> {
        if self.options.compliance.is_restricted() {
            self.state = DocumentState::Validating;
            if let Some(first) = compliance::validate(self).into_iter().next() {
                return Err(first.into());
            }
        }
        let objects = serializer::build_objects(self)?;
        let trailer = serializer::trailer(self, &objects);
        let version = self.options.compliance.pdf_version();
        self.state = DocumentState::Writing;
        serializer::write_document(&mut self.sink, version, &objects, &trailer)
    }

    /// Serialize into a fresh buffer without touching the sink or the
    /// document state. Output is byte-identical across calls.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.options.compliance.is_restricted() {
            if let Some(first) = compliance::validate(self).into_iter().next() {
                return Err(first.into());
            }
        }
        let objects = serializer::build_objects(self)?;
        let trailer = serializer::trailer(self, &objects);
        let mut buf = Vec::new();
        serializer::write_document(
            &mut buf,
            self.options.compliance.pdf_version(),
            &objects,
            &trailer,
        )?;
        Ok(buf)
    }

    /// Return the sink, consuming the document.
    pub fn into_inner(self) -> W {
        self.sink
    }
}
