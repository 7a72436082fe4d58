use std::collections::{BTreeMap, BTreeSet};

use byteorder::{BigEndian, ByteOrder};

use crate::error::{PdfError, Result};
use crate::objects::PdfObject;

/// Tables every embeddable font program must carry.
const REQUIRED_TABLES: [&[u8; 4]; 5] = [b"head", b"hhea", b"maxp", b"cmap", b"hmtx"];

const SFNT_TRUETYPE: u32 = 0x0001_0000;
const SFNT_APPLE_TRUE: u32 = 0x7472_7565; // 'true'
const SFNT_CFF: u32 = 0x4F54_544F; // 'OTTO'
const TTC_TAG: u32 = 0x7474_6366; // 'ttcf'

/// How a font program stores its glyph outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineFormat {
    /// `glyf` + `loca`, embedded as `/FontFile2`.
    TrueType,
    /// `CFF ` table, embedded as `/FontFile3 /Subtype /OpenType`.
    Cff,
}

/// Options for [`FontProgram::parse_with`].
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Face to load from a TrueType collection (`.ttc`). Ignored for
    /// single-face files.
    pub face_index: u32,
    /// Reject fonts whose table checksums disagree with the directory.
    pub verify_checksums: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            face_index: 0,
            verify_checksums: true,
        }
    }
}

/// One entry of the sfnt table directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TableRecord {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub offset: usize,
    pub length: usize,
}

impl TableRecord {
    fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// A parsed TrueType/OpenType font program: global metrics, the
/// codepoint → glyph mapping, per-glyph advances, and the raw bytes
/// that get embedded in the PDF.
#[derive(Debug, Clone)]
pub struct FontProgram {
    family_name: String,
    postscript_name: String,
    data: Vec<u8>,
    outline: OutlineFormat,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    bbox: [i16; 4],
    cap_height: i16,
    italic_angle: f64,
    flags: u32,
    stem_v: i16,
    /// Unicode codepoint -> glyph ID. Glyph 0 never appears here.
    cmap: BTreeMap<u32, u16>,
    /// Advance width in font units, indexed by glyph ID.
    glyph_widths: Vec<u16>,
    /// Glyph ID -> first codepoint mapped to it (for ToUnicode).
    glyph_to_unicode: BTreeMap<u16, u32>,
}

impl FontProgram {
    /// Parse a font with default options (face 0, checksums verified).
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        Self::parse_with(data, &LoadOptions::default())
    }

    /// Read and parse a font file. The whole file is loaded into memory.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref()).map_err(|e| {
            PdfError::MalformedFont(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::parse(data)
    }

    pub fn parse_with(data: Vec<u8>, options: &LoadOptions) -> Result<Self> {
        let (sfnt_version, tables) = read_table_directory(&data, options.face_index)?;
        check_required_tables(&tables)?;
        if options.verify_checksums {
            verify_checksums(&data, &tables)?;
        }
        // A collection face is embedded as a standalone sfnt.
        let (data, face_index) = if read_u32(&data, 0)? == TTC_TAG {
            (extract_face(&data, sfnt_version, &tables), 0)
        } else {
            (data, options.face_index)
        };
        let outline = if sfnt_version == SFNT_CFF || find_table(&tables, b"CFF ").is_some() {
            OutlineFormat::Cff
        } else {
            OutlineFormat::TrueType
        };

        let face = ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| PdfError::MalformedFont(format!("failed to parse font: {}", e)))?;

        let units_per_em = face.units_per_em();
        let ascent = face.ascender();
        let descent = face.descender();
        let bbox = face.global_bounding_box();
        let cap_height = face.capital_height().unwrap_or(ascent);
        let italic_angle = face.italic_angle() as f64;
        let flags = compute_flags(&face);
        let stem_v = estimate_stem_v(&face);

        let family_name = extract_name(&face, ttf_parser::name_id::FAMILY)
            .unwrap_or_else(|| "Unknown".to_string());
        let postscript_name = extract_name(&face, ttf_parser::name_id::POST_SCRIPT_NAME)
            .map(|n| sanitize_postscript_name(&n))
            .unwrap_or_else(|| sanitize_postscript_name(&family_name));

        let num_glyphs = face.number_of_glyphs();
        let mut cmap = BTreeMap::new();
        let mut glyph_to_unicode = BTreeMap::new();
        let subtables = face
            .tables()
            .cmap
            .ok_or_else(|| PdfError::MalformedFont("cmap table is unreadable".to_string()))?;
        for subtable in subtables.subtables {
            if !subtable.is_unicode() {
                continue;
            }
            subtable.codepoints(|cp| {
                if let Some(gid) = subtable.glyph_index(cp) {
                    // Glyph 0 and ids past maxp.numGlyphs stay unmapped.
                    if gid.0 != 0 && gid.0 < num_glyphs {
                        cmap.entry(cp).or_insert(gid.0);
                        glyph_to_unicode.entry(gid.0).or_insert(cp);
                    }
                }
            });
        }

        let glyph_widths: Vec<u16> = (0..num_glyphs)
            .map(|gid| face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0))
            .collect();

        log::debug!(
            "loaded font {} ({} glyphs, {} mapped codepoints, {} units/em)",
            postscript_name,
            num_glyphs,
            cmap.len(),
            units_per_em
        );

        drop(face);
        Ok(FontProgram {
            family_name,
            postscript_name,
            data,
            outline,
            units_per_em,
            ascent,
            descent,
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            cap_height,
            italic_angle,
            flags,
            stem_v,
            cmap,
            glyph_widths,
            glyph_to_unicode,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    /// Font bytes as embedded: the input unchanged, or the selected face
    /// rebuilt as a standalone sfnt when the input was a collection.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn outline(&self) -> OutlineFormat {
        self.outline
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn ascent(&self) -> i16 {
        self.ascent
    }

    pub fn descent(&self) -> i16 {
        self.descent
    }

    pub fn glyph_count(&self) -> usize {
        self.glyph_widths.len()
    }

    /// Glyph for a codepoint, or `None` when the font leaves it to `.notdef`.
    pub fn glyph_index(&self, ch: char) -> Option<u16> {
        self.cmap.get(&(ch as u32)).copied()
    }

    /// Advance width of a glyph in font units. Glyphs past the end of
    /// `hmtx` report 0.
    pub fn advance_width(&self, gid: u16) -> u16 {
        self.glyph_widths.get(gid as usize).copied().unwrap_or(0)
    }

    /// Codepoint a glyph was first mapped from, if any.
    pub fn unicode_for_glyph(&self, gid: u16) -> Option<u32> {
        self.glyph_to_unicode.get(&gid).copied()
    }

    /// Scale a font-unit value to PDF glyph space (1/1000 em).
    pub(crate) fn scale_to_pdf(&self, value: i32) -> i64 {
        (value as i64 * 1000) / self.units_per_em as i64
    }

    /// Build the FontDescriptor entries shared by every font kind.
    pub(crate) fn descriptor_entries(&self) -> Vec<(&'static str, PdfObject)> {
        vec![
            ("Type", PdfObject::name("FontDescriptor")),
            ("FontName", PdfObject::name(&self.postscript_name)),
            ("Flags", PdfObject::Integer(self.flags as i64)),
            (
                "FontBBox",
                PdfObject::array(
                    self.bbox
                        .iter()
                        .map(|&v| PdfObject::Integer(self.scale_to_pdf(v as i32)))
                        .collect(),
                ),
            ),
            ("ItalicAngle", PdfObject::Real(self.italic_angle)),
            ("Ascent", PdfObject::Integer(self.scale_to_pdf(self.ascent as i32))),
            ("Descent", PdfObject::Integer(self.scale_to_pdf(self.descent as i32))),
            ("CapHeight", PdfObject::Integer(self.scale_to_pdf(self.cap_height as i32))),
            ("StemV", PdfObject::Integer(self.stem_v as i64)),
        ]
    }

    /// Build the CIDFont `/W` array for the given glyphs.
    /// Format: `[cid [w1 w2 ...] cid [w1 w2 ...] ...]`, one group per
    /// run of consecutive glyph IDs.
    pub fn build_w_array(&self, used: &BTreeSet<u16>) -> Vec<PdfObject> {
        let sorted: Vec<u16> = used.iter().copied().collect();
        let mut result = Vec::new();
        let mut i = 0;
        while i < sorted.len() {
            let start = sorted[i];
            let mut widths = Vec::new();
            let mut j = i;
            while j < sorted.len() && sorted[j] as usize == start as usize + (j - i) {
                let raw = self.advance_width(sorted[j]);
                widths.push(PdfObject::Integer(self.scale_to_pdf(raw as i32)));
                j += 1;
            }
            result.push(PdfObject::Integer(start as i64));
            result.push(PdfObject::Array(widths));
            i = j;
        }
        result
    }

    /// Build the ToUnicode CMap stream content for the given glyphs.
    pub fn build_tounicode_cmap(&self, used: &BTreeSet<u16>) -> Vec<u8> {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo\n\
             << /Registry (Adobe)\n\
             /Ordering (UCS)\n\
             /Supplement 0\n\
             >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n\
             <0000> <FFFF>\n\
             endcodespacerange\n",
        );

        let mappings: Vec<(u16, u32)> = used
            .iter()
            .filter_map(|&gid| self.unicode_for_glyph(gid).map(|cp| (gid, cp)))
            .collect();

        // At most 100 entries per beginbfchar block.
        for chunk in mappings.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for &(gid, cp) in chunk {
                cmap.push_str(&format!("<{:04X}> <{}>\n", gid, utf16_hex(cp)));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str(
            "endcmap\n\
             CMapName currentdict /CMap defineresource pop\n\
             end\n\
             end\n",
        );
        cmap.into_bytes()
    }
}

/// Parse the sfnt header (or the TTC header plus the selected face's
/// header) and return the sfnt version with the table records.
pub(crate) fn read_table_directory(data: &[u8], face_index: u32) -> Result<(u32, Vec<TableRecord>)> {
    let mut base = 0usize;
    if read_u32(data, 0)? == TTC_TAG {
        let num_fonts = read_u32(data, 8)?;
        if face_index >= num_fonts {
            return Err(PdfError::MalformedFont(format!(
                "face index {} out of range, collection has {} faces",
                face_index, num_fonts
            )));
        }
        base = read_u32(data, 12 + 4 * face_index as usize)? as usize;
    }

    let version = read_u32(data, base)?;
    if !matches!(version, SFNT_TRUETYPE | SFNT_APPLE_TRUE | SFNT_CFF) {
        return Err(PdfError::MalformedFont(format!(
            "unknown sfnt version 0x{:08X}",
            version
        )));
    }
    let num_tables = read_u16(data, base + 4)? as usize;

    let mut tables = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let rec = base + 12 + i * 16;
        let tag_bytes = data
            .get(rec..rec + 4)
            .ok_or_else(|| truncated("table directory"))?;
        let mut tag = [0u8; 4];
        tag.copy_from_slice(tag_bytes);
        let record = TableRecord {
            tag,
            checksum: read_u32(data, rec + 4)?,
            offset: read_u32(data, rec + 8)? as usize,
            length: read_u32(data, rec + 12)? as usize,
        };
        let end = record.offset.checked_add(record.length);
        if end.map_or(true, |end| end > data.len()) {
            return Err(PdfError::MalformedFont(format!(
                "table '{}' extends past end of file",
                record.tag_str()
            )));
        }
        tables.push(record);
    }
    Ok((version, tables))
}

/// Rebuild one collection face as a standalone sfnt: a fresh table
/// directory, each table copied and padded to four bytes, and
/// `head.checkSumAdjustment` recomputed for the new file.
fn extract_face(data: &[u8], sfnt_version: u32, tables: &[TableRecord]) -> Vec<u8> {
    let mut records = tables.to_vec();
    records.sort_by_key(|t| t.tag);

    let num_tables = records.len() as u32;
    let entry_selector = num_tables.max(1).ilog2();
    let search_range = (1u32 << entry_selector) * 16;
    let range_shift = (num_tables * 16).saturating_sub(search_range);

    let mut out = Vec::new();
    out.extend_from_slice(&sfnt_version.to_be_bytes());
    for value in [num_tables, search_range, entry_selector, range_shift] {
        out.extend_from_slice(&(value as u16).to_be_bytes());
    }

    let mut offset = 12 + 16 * records.len();
    let mut head_offset = None;
    for table in &records {
        if &table.tag == b"head" {
            head_offset = Some(offset);
        }
        out.extend_from_slice(&table.tag);
        out.extend_from_slice(&table.checksum.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(table.length as u32).to_be_bytes());
        offset += (table.length + 3) & !3;
    }
    for table in &records {
        out.extend_from_slice(&data[table.offset..table.offset + table.length]);
        out.resize((out.len() + 3) & !3, 0);
    }

    if let Some(head) = head_offset.filter(|&h| h + 12 <= out.len()) {
        out[head + 8..head + 12].fill(0);
        let adjustment = 0xB1B0_AFBAu32.wrapping_sub(table_checksum(&out));
        BigEndian::write_u32(&mut out[head + 8..head + 12], adjustment);
    }
    out
}

fn find_table<'a>(tables: &'a [TableRecord], tag: &[u8; 4]) -> Option<&'a TableRecord> {
    tables.iter().find(|t| &t.tag == tag)
}

fn check_required_tables(tables: &[TableRecord]) -> Result<()> {
    for tag in REQUIRED_TABLES {
        if find_table(tables, tag).is_none() {
            return Err(PdfError::MalformedFont(format!(
                "missing required table '{}'",
                String::from_utf8_lossy(tag)
            )));
        }
    }
    let has_glyf = find_table(tables, b"glyf").is_some() && find_table(tables, b"loca").is_some();
    let has_cff = find_table(tables, b"CFF ").is_some();
    if !has_glyf && !has_cff {
        return Err(PdfError::MalformedFont(
            "missing glyph outlines (neither glyf/loca nor CFF)".to_string(),
        ));
    }
    Ok(())
}

fn verify_checksums(data: &[u8], tables: &[TableRecord]) -> Result<()> {
    for table in tables {
        let bytes = &data[table.offset..table.offset + table.length];
        let actual = if &table.tag == b"head" {
            // checkSumAdjustment (bytes 8..12) counts as zero.
            let mut head = bytes.to_vec();
            if head.len() >= 12 {
                head[8..12].fill(0);
            }
            table_checksum(&head)
        } else {
            table_checksum(bytes)
        };
        if actual != table.checksum {
            return Err(PdfError::MalformedFont(format!(
                "checksum mismatch in table '{}': expected 0x{:08X}, found 0x{:08X}",
                table.tag_str(),
                table.checksum,
                actual
            )));
        }
    }
    Ok(())
}

/// Sum of big-endian u32 words, the final word zero-padded.
pub(crate) fn table_checksum(bytes: &[u8]) -> u32 {
    bytes.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(BigEndian::read_u32(&word))
    })
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    data.get(offset..offset + 4)
        .map(BigEndian::read_u32)
        .ok_or_else(|| truncated("sfnt header"))
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    data.get(offset..offset + 2)
        .map(BigEndian::read_u16)
        .ok_or_else(|| truncated("sfnt header"))
}

fn truncated(what: &str) -> PdfError {
    PdfError::MalformedFont(format!("truncated {}", what))
}

/// Hex UTF-16BE code units for a ToUnicode destination string.
fn utf16_hex(cp: u32) -> String {
    let ch = char::from_u32(cp).unwrap_or('\u{FFFD}');
    let mut buf = [0u16; 2];
    ch.encode_utf16(&mut buf)
        .iter()
        .map(|unit| format!("{:04X}", unit))
        .collect()
}

/// Extract a Unicode name record from the name table.
fn extract_name(face: &ttf_parser::Face, name_id: u16) -> Option<String> {
    face.names()
        .into_iter()
        .find(|name| name.name_id == name_id && name.is_unicode())
        .and_then(|name| name.to_string())
}

/// PostScript names may not contain whitespace or PDF delimiters.
fn sanitize_postscript_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .collect();
    if cleaned.is_empty() {
        "Unknown".to_string()
    } else {
        cleaned
    }
}

/// Compute PDF font descriptor flags from the font tables.
fn compute_flags(face: &ttf_parser::Face) -> u32 {
    let mut flags = 0u32;
    // Bit 1: FixedPitch
    if face.is_monospaced() {
        flags |= 1;
    }
    // Bit 3 (Symbolic): glyphs are addressed by CID, not a standard
    // Latin character set.
    flags |= 4;
    // Bit 7: Italic
    if face.is_italic() {
        flags |= 64;
    }
    flags
}

/// Estimate StemV from the font's weight class.
fn estimate_stem_v(face: &ttf_parser::Face) -> i16 {
    let w = face.weight().to_number() as f64 / 1000.0;
    (10.0 + 220.0 * w * w) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory(version: u32, records: &[(&[u8; 4], u32, u32, u32)]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&version.to_be_bytes());
        data.extend_from_slice(&(records.len() as u16).to_be_bytes());
        data.extend_from_slice(&[0u8; 6]);
        for (tag, checksum, offset, length) in records {
            data.extend_from_slice(*tag);
            data.extend_from_slice(&checksum.to_be_bytes());
            data.extend_from_slice(&offset.to_be_bytes());
            data.extend_from_slice(&length.to_be_bytes());
        }
        data
    }

    #[test]
    fn checksum_pads_last_word() {
        assert_eq!(table_checksum(&[0, 0, 0, 1, 0, 0, 0, 2]), 3);
        assert_eq!(table_checksum(&[1]), 0x0100_0000);
        assert_eq!(table_checksum(&[0xFF; 8]), 0xFFFF_FFFE);
    }

    #[test]
    fn directory_rejects_unknown_version() {
        let data = directory(0xDEAD_BEEF, &[]);
        let err = read_table_directory(&data, 0).unwrap_err();
        assert!(err.to_string().contains("unknown sfnt version"));
    }

    #[test]
    fn directory_rejects_table_past_eof() {
        let data = directory(SFNT_TRUETYPE, &[(b"head", 0, 28, 54)]);
        let err = read_table_directory(&data, 0).unwrap_err();
        assert!(err.to_string().contains("'head' extends past end of file"));
    }

    #[test]
    fn directory_reads_records() {
        let mut data = directory(SFNT_TRUETYPE, &[(b"abcd", 7, 28, 4)]);
        data.extend_from_slice(&[0, 0, 0, 7]);
        let (version, tables) = read_table_directory(&data, 0).unwrap();
        assert_eq!(version, SFNT_TRUETYPE);
        assert_eq!(tables.len(), 1);
        assert_eq!(&tables[0].tag, b"abcd");
        assert_eq!(tables[0].offset, 28);
        verify_checksums(&data, &tables).unwrap();
    }

    #[test]
    fn truncated_header_is_malformed() {
        let err = read_table_directory(&[0, 1], 0).unwrap_err();
        assert!(matches!(err, PdfError::MalformedFont(_)));
    }

    #[test]
    fn missing_outlines_reported() {
        let tables: Vec<TableRecord> = REQUIRED_TABLES
            .iter()
            .map(|tag| TableRecord {
                tag: **tag,
                checksum: 0,
                offset: 0,
                length: 0,
            })
            .collect();
        let err = check_required_tables(&tables).unwrap_err();
        assert!(err.to_string().contains("missing glyph outlines"));
    }

    #[test]
    fn postscript_names_are_sanitized() {
        assert_eq!(sanitize_postscript_name("DejaVu Sans"), "DejaVuSans");
        assert_eq!(sanitize_postscript_name("A(b)/c"), "Abc");
        assert_eq!(sanitize_postscript_name("  "), "Unknown");
    }

    #[test]
    fn utf16_hex_handles_astral_codepoints() {
        assert_eq!(utf16_hex(0x41), "0041");
        assert_eq!(utf16_hex(0x1F600), "D83DDE00");
    }
}
