//! Turns a document's object graph into concrete PDF objects and writes
//! them out. Objects are emitted in increasing id order, so the same
//! document always produces the same bytes.

use std::collections::{BTreeSet, HashSet};
use std::io::Write;

use crate::content;
use crate::document::{Document, Font, FontKind};
use crate::error::{PdfError, Result};
use crate::graph::{FontHandle, NodeKind};
use crate::metadata;
use crate::objects::{ObjId, PdfObject};
use crate::page::Page;
use crate::truetype::{FontProgram, OutlineFormat};
use crate::writer::{PdfWriter, Trailer};

/// Build every object the document will write, in id order, and check
/// that each reference points at one of them.
pub(crate) fn build_objects<W: Write>(doc: &Document<W>) -> Result<Vec<(ObjId, PdfObject)>> {
    let mut objects = Vec::with_capacity(doc.graph().len());
    for (id, kind) in doc.graph().iter() {
        let obj = build_object(doc, id, kind)?;
        objects.push((id, obj));
    }
    check_references(&objects)?;
    Ok(objects)
}

fn build_object<W: Write>(doc: &Document<W>, id: ObjId, kind: NodeKind) -> Result<PdfObject> {
    match kind {
        NodeKind::Catalog => Ok(catalog(doc)),
        NodeKind::PageTree => {
            let kids = doc
                .pages()
                .map(|p| PdfObject::reference(p.object_id()))
                .collect();
            Ok(PdfObject::dict(vec![
                ("Type", PdfObject::name("Pages")),
                ("Kids", PdfObject::Array(kids)),
                ("Count", PdfObject::Integer(doc.page_count() as i64)),
            ]))
        }
        NodeKind::Info => Ok(doc.info().to_dict()),
        NodeKind::Page(handle) => {
            let page = doc
                .page(handle)
                .ok_or_else(|| PdfError::broken(handle, format!("object {}", id)))?;
            page_dict(doc, page)
        }
        NodeKind::Contents(handle) => {
            let page = doc
                .page(handle)
                .ok_or_else(|| PdfError::broken(handle, format!("object {}", id)))?;
            let data = page.content().encode(|f| doc.font_resource(f))?;
            maybe_compressed(Vec::new(), data, doc.options().compress)
        }
        NodeKind::Type0Font(handle) => {
            let (font, program) = embedded(doc, handle, id)?;
            type0_dict(font, program)
        }
        NodeKind::CidFont(handle) => {
            let (font, program) = embedded(doc, handle, id)?;
            cid_font_dict(font, program)
        }
        NodeKind::FontDescriptor(handle) => {
            let (font, program) = embedded(doc, handle, id)?;
            let file = required(font.objects.file, handle, "font file")?;
            let key = match program.outline() {
                OutlineFormat::TrueType => "FontFile2",
                OutlineFormat::Cff => "FontFile3",
            };
            let mut entries = program.descriptor_entries();
            entries.push((key, PdfObject::reference(file)));
            Ok(PdfObject::dict(entries))
        }
        NodeKind::FontFile(handle) => {
            let (_, program) = embedded(doc, handle, id)?;
            font_file(program, doc.options().compress)
        }
        NodeKind::ToUnicode(handle) => {
            let (font, program) = embedded(doc, handle, id)?;
            let cmap = program.build_tounicode_cmap(font.used_glyphs());
            maybe_compressed(Vec::new(), cmap, doc.options().compress)
        }
        NodeKind::SimpleFont(handle) => {
            let font = doc
                .font(handle)
                .ok_or_else(|| PdfError::broken(handle, format!("object {}", id)))?;
            match font.kind() {
                FontKind::Builtin(builtin) => Ok(PdfObject::dict(vec![
                    ("Type", PdfObject::name("Font")),
                    ("Subtype", PdfObject::name("Type1")),
                    ("BaseFont", PdfObject::name(builtin.base_name())),
                    ("Encoding", PdfObject::name("WinAnsiEncoding")),
                ])),
                FontKind::TrueType(_) => Err(PdfError::broken(
                    handle,
                    format!("object {} expects a standard font", id),
                )),
            }
        }
        NodeKind::Metadata => {
            // XMP stays uncompressed so it can be found without a PDF parser.
            let xmp = metadata::build_xmp(doc.info()).into_bytes();
            Ok(PdfObject::stream(
                vec![
                    ("Type", PdfObject::name("Metadata")),
                    ("Subtype", PdfObject::name("XML")),
                ],
                xmp,
            ))
        }
        NodeKind::IccProfile => {
            let intent = doc
                .output_intent()
                .ok_or_else(|| PdfError::broken(id, "ICC profile without an output intent"))?;
            maybe_compressed(
                vec![
                    ("N", PdfObject::Integer(intent.components as i64)),
                    ("Alternate", PdfObject::name(intent.alternate_space())),
                ],
                intent.profile.clone(),
                doc.options().compress,
            )
        }
    }
}

fn catalog<W: Write>(doc: &Document<W>) -> PdfObject {
    let mut entries = vec![
        ("Type", PdfObject::name("Catalog")),
        ("Pages", PdfObject::reference(doc.pages_id())),
    ];
    if let Some(id) = doc.metadata_id() {
        entries.push(("Metadata", PdfObject::reference(id)));
    }
    if let (Some(intent), Some(icc)) = (doc.output_intent(), doc.icc_id()) {
        entries.push((
            "OutputIntents",
            PdfObject::array(vec![intent.to_dict(PdfObject::reference(icc))]),
        ));
    }
    PdfObject::dict(entries)
}

fn page_dict<W: Write>(doc: &Document<W>, page: &Page) -> Result<PdfObject> {
    let used: BTreeSet<FontHandle> = page.content().text_runs().map(|r| r.font).collect();
    let mut fonts = Vec::with_capacity(used.len());
    for handle in used {
        let font = doc.font(handle).ok_or_else(|| {
            PdfError::broken(handle, format!("font resource of page {}", page.object_id()))
        })?;
        fonts.push((
            font.resource_name().to_string(),
            PdfObject::reference(font.object_id()),
        ));
    }

    let size = page.size();
    Ok(PdfObject::dict(vec![
        ("Type", PdfObject::name("Page")),
        ("Parent", PdfObject::reference(doc.pages_id())),
        ("MediaBox", PdfObject::rect([0.0, 0.0, size.width, size.height])),
        ("Contents", PdfObject::reference(page.content_id)),
        (
            "Resources",
            PdfObject::dict(vec![("Font", PdfObject::Dictionary(fonts))]),
        ),
    ]))
}

fn type0_dict(font: &Font, program: &FontProgram) -> Result<PdfObject> {
    let name = font.resource_name();
    let descendant = font
        .objects
        .descendant
        .ok_or_else(|| PdfError::broken(name, "descendant font"))?;
    let to_unicode = font
        .objects
        .to_unicode
        .ok_or_else(|| PdfError::broken(name, "ToUnicode map"))?;
    Ok(PdfObject::dict(vec![
        ("Type", PdfObject::name("Font")),
        ("Subtype", PdfObject::name("Type0")),
        ("BaseFont", PdfObject::name(program.postscript_name())),
        ("Encoding", PdfObject::name("Identity-H")),
        (
            "DescendantFonts",
            PdfObject::array(vec![PdfObject::reference(descendant)]),
        ),
        ("ToUnicode", PdfObject::reference(to_unicode)),
    ]))
}

fn cid_font_dict(font: &Font, program: &FontProgram) -> Result<PdfObject> {
    let descriptor = font
        .objects
        .descriptor
        .ok_or_else(|| PdfError::broken(font.resource_name(), "font descriptor"))?;
    let subtype = match program.outline() {
        OutlineFormat::TrueType => "CIDFontType2",
        OutlineFormat::Cff => "CIDFontType0",
    };
    let default_width = program.scale_to_pdf(program.advance_width(0) as i32);

    let mut entries = vec![
        ("Type", PdfObject::name("Font")),
        ("Subtype", PdfObject::name(subtype)),
        ("BaseFont", PdfObject::name(program.postscript_name())),
        (
            "CIDSystemInfo",
            PdfObject::dict(vec![
                ("Registry", PdfObject::literal_string("Adobe")),
                ("Ordering", PdfObject::literal_string("Identity")),
                ("Supplement", PdfObject::Integer(0)),
            ]),
        ),
        ("FontDescriptor", PdfObject::reference(descriptor)),
        ("DW", PdfObject::Integer(default_width)),
        (
            "W",
            PdfObject::Array(program.build_w_array(font.used_glyphs())),
        ),
    ];
    if program.outline() == OutlineFormat::TrueType {
        entries.push(("CIDToGIDMap", PdfObject::name("Identity")));
    }
    Ok(PdfObject::dict(entries))
}

fn font_file(program: &FontProgram, compress: bool) -> Result<PdfObject> {
    let data = program.data().to_vec();
    let extra = match program.outline() {
        OutlineFormat::TrueType => ("Length1", PdfObject::Integer(data.len() as i64)),
        OutlineFormat::Cff => ("Subtype", PdfObject::name("OpenType")),
    };
    maybe_compressed(vec![extra], data, compress)
}

/// A stream, deflated with `/Filter /FlateDecode` when `compress` is set.
fn maybe_compressed(
    mut entries: Vec<(&str, PdfObject)>,
    data: Vec<u8>,
    compress: bool,
) -> Result<PdfObject> {
    if !compress {
        return Ok(PdfObject::stream(entries, data));
    }
    let packed = content::compress(&data)?;
    entries.push(("Filter", PdfObject::name("FlateDecode")));
    Ok(PdfObject::stream(entries, packed))
}

fn embedded<'d, W: Write>(
    doc: &'d Document<W>,
    handle: FontHandle,
    id: ObjId,
) -> Result<(&'d Font, &'d FontProgram)> {
    let font = doc
        .font(handle)
        .ok_or_else(|| PdfError::broken(handle, format!("object {}", id)))?;
    match font.kind() {
        FontKind::TrueType(program) => Ok((font, program)),
        FontKind::Builtin(_) => Err(PdfError::broken(
            handle,
            format!("object {} expects an embedded font", id),
        )),
    }
}

fn required(id: Option<ObjId>, handle: FontHandle, what: &str) -> Result<ObjId> {
    id.ok_or_else(|| PdfError::broken(handle, what))
}

fn check_references(objects: &[(ObjId, PdfObject)]) -> Result<()> {
    let known: HashSet<ObjId> = objects.iter().map(|(id, _)| *id).collect();
    let mut refs = Vec::new();
    for (id, obj) in objects {
        refs.clear();
        obj.collect_references(&mut refs);
        if let Some(missing) = refs.iter().find(|r| !known.contains(r)) {
            return Err(PdfError::broken(missing, format!("referenced from object {}", id)));
        }
    }
    Ok(())
}

/// Trailer for the built objects. The file identifier is a digest of
/// the metadata and every stream, so it changes only with content.
pub(crate) fn trailer<W: Write>(doc: &Document<W>, objects: &[(ObjId, PdfObject)]) -> Trailer {
    let streams = objects.iter().filter_map(|(_, obj)| match obj {
        PdfObject::Stream { data, .. } => Some(data.as_slice()),
        _ => None,
    });
    Trailer {
        root: doc.catalog_id(),
        info: Some(doc.info_id()),
        file_id: Some(metadata::file_identifier(doc.info(), streams)),
    }
}

/// Header, objects in the given order, xref and trailer.
pub(crate) fn write_document<S: Write>(
    sink: S,
    version: &str,
    objects: &[(ObjId, PdfObject)],
    trailer: &Trailer,
) -> Result<()> {
    let mut writer = PdfWriter::new(sink);
    writer.write_header(version)?;
    for (id, obj) in objects {
        writer.write_object(*id, obj)?;
    }
    let xref_at = writer.current_offset();
    writer.write_xref_and_trailer(trailer)?;
    log::debug!(
        "wrote PDF {} with {} objects, xref at {}",
        version,
        objects.len(),
        xref_at
    );
    Ok(())
}
