//! Test fixtures: a minimal TrueType font synthesizer, an ICC profile
//! header, and a fixed creation date, so tests need no files on disk.
#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, TimeZone};

/// Builds a small but well-formed TrueType font: `head`, `hhea`,
/// `maxp`, `cmap` (format 4), `hmtx`, `loca`, `glyf` and `name`, with
/// valid table checksums. Glyph 0 is `.notdef`; each added character
/// gets the next glyph id. Outlines are empty.
#[derive(Debug, Clone)]
pub struct FontBuilder {
    family: String,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    notdef_advance: u16,
    glyphs: Vec<(char, u16)>,
    skip: Vec<[u8; 4]>,
}

impl Default for FontBuilder {
    fn default() -> Self {
        FontBuilder {
            family: "Test Sans".to_string(),
            units_per_em: 1000,
            ascent: 800,
            descent: -200,
            notdef_advance: 500,
            glyphs: Vec::new(),
            skip: Vec::new(),
        }
    }
}

impl FontBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn family(mut self, name: &str) -> Self {
        self.family = name.to_string();
        self
    }

    pub fn units_per_em(mut self, upem: u16) -> Self {
        self.units_per_em = upem;
        self
    }

    pub fn metrics(mut self, ascent: i16, descent: i16) -> Self {
        self.ascent = ascent;
        self.descent = descent;
        self
    }

    pub fn notdef_advance(mut self, advance: u16) -> Self {
        self.notdef_advance = advance;
        self
    }

    /// Map a BMP character to a new glyph with the given advance.
    pub fn glyph(mut self, ch: char, advance: u16) -> Self {
        assert!((ch as u32) < 0xFFFF, "format 4 cmap covers the BMP only");
        if !self.glyphs.iter().any(|(c, _)| *c == ch) {
            self.glyphs.push((ch, advance));
        }
        self
    }

    pub fn glyphs<I: IntoIterator<Item = char>>(mut self, chars: I, advance: u16) -> Self {
        for ch in chars {
            self = self.glyph(ch, advance);
        }
        self
    }

    /// Leave a table out of the file.
    pub fn without_table(mut self, tag: &[u8; 4]) -> Self {
        self.skip.push(*tag);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let num_glyphs = self.glyphs.len() as u16 + 1;
        let mut tables: Vec<([u8; 4], Vec<u8>)> = vec![
            (*b"head", self.head()),
            (*b"hhea", self.hhea(num_glyphs)),
            (*b"maxp", maxp(num_glyphs)),
            (*b"cmap", self.cmap()),
            (*b"hmtx", self.hmtx()),
            (*b"loca", vec![0u8; (num_glyphs as usize + 1) * 2]),
            (*b"glyf", vec![0u8; 4]),
            (*b"name", self.name()),
        ];
        tables.retain(|(tag, _)| !self.skip.contains(tag));
        tables.sort_by(|a, b| a.0.cmp(&b.0));
        assemble(&tables)
    }

    fn head(&self) -> Vec<u8> {
        let mut t = Vec::with_capacity(54);
        t.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
        t.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // fontRevision
        t.extend_from_slice(&0u32.to_be_bytes()); // checkSumAdjustment, patched later
        t.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes()); // magic
        t.extend_from_slice(&0u16.to_be_bytes()); // flags
        t.extend_from_slice(&self.units_per_em.to_be_bytes());
        t.extend_from_slice(&[0u8; 16]); // created, modified
        t.extend_from_slice(&0i16.to_be_bytes()); // xMin
        t.extend_from_slice(&self.descent.to_be_bytes()); // yMin
        t.extend_from_slice(&(self.units_per_em as i16).to_be_bytes()); // xMax
        t.extend_from_slice(&self.ascent.to_be_bytes()); // yMax
        t.extend_from_slice(&0u16.to_be_bytes()); // macStyle
        t.extend_from_slice(&8u16.to_be_bytes()); // lowestRecPPEM
        t.extend_from_slice(&2i16.to_be_bytes()); // fontDirectionHint
        t.extend_from_slice(&0i16.to_be_bytes()); // indexToLocFormat: short
        t.extend_from_slice(&0i16.to_be_bytes()); // glyphDataFormat
        t
    }

    fn hhea(&self, num_glyphs: u16) -> Vec<u8> {
        let max_advance = self
            .glyphs
            .iter()
            .map(|(_, a)| *a)
            .chain([self.notdef_advance])
            .max()
            .unwrap_or(0);
        let mut t = Vec::with_capacity(36);
        t.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        t.extend_from_slice(&self.ascent.to_be_bytes());
        t.extend_from_slice(&self.descent.to_be_bytes());
        t.extend_from_slice(&0i16.to_be_bytes()); // lineGap
        t.extend_from_slice(&max_advance.to_be_bytes());
        t.extend_from_slice(&[0u8; 10]); // minLSB, minRSB, xMaxExtent, caretSlopeRise, caretSlopeRun
        t.extend_from_slice(&[0u8; 2]); // caretOffset
        t.extend_from_slice(&[0u8; 8]); // reserved
        t.extend_from_slice(&0i16.to_be_bytes()); // metricDataFormat
        t.extend_from_slice(&num_glyphs.to_be_bytes());
        t
    }

    fn hmtx(&self) -> Vec<u8> {
        let mut t = Vec::new();
        for advance in [self.notdef_advance]
            .into_iter()
            .chain(self.glyphs.iter().map(|(_, a)| *a))
        {
            t.extend_from_slice(&advance.to_be_bytes());
            t.extend_from_slice(&0i16.to_be_bytes());
        }
        t
    }

    /// Windows Unicode BMP subtable, one segment per character.
    fn cmap(&self) -> Vec<u8> {
        let mut mapped: Vec<(u16, u16)> = self
            .glyphs
            .iter()
            .enumerate()
            .map(|(i, (ch, _))| (*ch as u16, i as u16 + 1))
            .collect();
        mapped.sort();

        let seg_count = mapped.len() as u16 + 1;
        let mut sub = Vec::new();
        sub.extend_from_slice(&4u16.to_be_bytes()); // format
        sub.extend_from_slice(&0u16.to_be_bytes()); // length, patched below
        sub.extend_from_slice(&0u16.to_be_bytes()); // language
        sub.extend_from_slice(&(seg_count * 2).to_be_bytes());
        let mut search_range = 2u16;
        let mut entry_selector = 0u16;
        while search_range * 2 <= seg_count * 2 {
            search_range *= 2;
            entry_selector += 1;
        }
        sub.extend_from_slice(&search_range.to_be_bytes());
        sub.extend_from_slice(&entry_selector.to_be_bytes());
        sub.extend_from_slice(&(seg_count * 2 - search_range).to_be_bytes());
        for (cp, _) in &mapped {
            sub.extend_from_slice(&cp.to_be_bytes()); // endCode
        }
        sub.extend_from_slice(&0xFFFFu16.to_be_bytes());
        sub.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
        for (cp, _) in &mapped {
            sub.extend_from_slice(&cp.to_be_bytes()); // startCode
        }
        sub.extend_from_slice(&0xFFFFu16.to_be_bytes());
        for (cp, gid) in &mapped {
            sub.extend_from_slice(&gid.wrapping_sub(*cp).to_be_bytes()); // idDelta
        }
        sub.extend_from_slice(&1u16.to_be_bytes());
        for _ in 0..seg_count {
            sub.extend_from_slice(&0u16.to_be_bytes()); // idRangeOffset
        }
        let len = sub.len() as u16;
        sub[2..4].copy_from_slice(&len.to_be_bytes());

        let mut t = Vec::new();
        t.extend_from_slice(&0u16.to_be_bytes()); // version
        t.extend_from_slice(&1u16.to_be_bytes()); // numTables
        t.extend_from_slice(&3u16.to_be_bytes()); // platform: Windows
        t.extend_from_slice(&1u16.to_be_bytes()); // encoding: Unicode BMP
        t.extend_from_slice(&12u32.to_be_bytes()); // subtable offset
        t.extend_from_slice(&sub);
        t
    }

    /// Family (1) and PostScript (6) names, Windows UTF-16BE.
    fn name(&self) -> Vec<u8> {
        let family: Vec<u8> = utf16be(&self.family);
        let postscript: Vec<u8> = utf16be(&self.family.replace(' ', ""));
        let records = [(1u16, &family), (6u16, &postscript)];

        let mut t = Vec::new();
        t.extend_from_slice(&0u16.to_be_bytes()); // format
        t.extend_from_slice(&(records.len() as u16).to_be_bytes());
        t.extend_from_slice(&(6 + 12 * records.len() as u16).to_be_bytes()); // stringOffset
        let mut offset = 0u16;
        for (name_id, bytes) in &records {
            t.extend_from_slice(&3u16.to_be_bytes());
            t.extend_from_slice(&1u16.to_be_bytes());
            t.extend_from_slice(&0x0409u16.to_be_bytes());
            t.extend_from_slice(&name_id.to_be_bytes());
            t.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
            t.extend_from_slice(&offset.to_be_bytes());
            offset += bytes.len() as u16;
        }
        for (_, bytes) in &records {
            t.extend_from_slice(bytes);
        }
        t
    }
}

fn maxp(num_glyphs: u16) -> Vec<u8> {
    let mut t = Vec::new();
    t.extend_from_slice(&0x0000_5000u32.to_be_bytes());
    t.extend_from_slice(&num_glyphs.to_be_bytes());
    t
}

fn utf16be(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
}

pub fn checksum(bytes: &[u8]) -> u32 {
    bytes.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Lay out the offset table, the directory and the 4-byte aligned
/// table data, then patch `head.checkSumAdjustment`.
fn assemble(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&num_tables.to_be_bytes());
    out.extend_from_slice(&[0u8; 6]); // searchRange, entrySelector, rangeShift

    let mut offset = 12 + 16 * tables.len();
    let mut head_offset = None;
    for (tag, data) in tables {
        out.extend_from_slice(tag);
        out.extend_from_slice(&checksum(data).to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        if tag == b"head" {
            head_offset = Some(offset);
        }
        offset += (data.len() + 3) & !3;
    }
    for (_, data) in tables {
        out.extend_from_slice(data);
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }
    if let Some(head) = head_offset {
        let adjustment = 0xB1B0_AFBAu32.wrapping_sub(checksum(&out));
        out[head + 8..head + 12].copy_from_slice(&adjustment.to_be_bytes());
    }
    out
}

/// Offset and length of a table in a built font.
pub fn table_range(font: &[u8], tag: &[u8; 4]) -> Option<(usize, usize)> {
    let num_tables = u16::from_be_bytes([font[4], font[5]]) as usize;
    (0..num_tables).find_map(|i| {
        let rec = 12 + 16 * i;
        if &font[rec..rec + 4] != tag {
            return None;
        }
        let word = |at: usize| u32::from_be_bytes([font[at], font[at + 1], font[at + 2], font[at + 3]]);
        Some((word(rec + 8) as usize, word(rec + 12) as usize))
    })
}

/// Flip one byte inside a table so its checksum no longer matches.
pub fn corrupt_table(font: &mut [u8], tag: &[u8; 4]) {
    let (offset, _) = table_range(font, tag).expect("table present");
    font[offset] ^= 0xA5;
}

/// Wrap fonts into a TrueType collection (`ttcf` 1.0), rebasing each
/// face's table offsets to its position in the collection.
pub fn collection(fonts: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"ttcf");
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&(fonts.len() as u32).to_be_bytes());
    let mut base = 12 + 4 * fonts.len();
    for font in fonts {
        out.extend_from_slice(&(base as u32).to_be_bytes());
        base += font.len();
    }
    for font in fonts {
        let base = out.len() as u32;
        let mut face = font.clone();
        let num_tables = u16::from_be_bytes([face[4], face[5]]) as usize;
        for i in 0..num_tables {
            let at = 12 + 16 * i + 8;
            let offset = u32::from_be_bytes([face[at], face[at + 1], face[at + 2], face[at + 3]]);
            face[at..at + 4].copy_from_slice(&(offset + base).to_be_bytes());
        }
        out.extend_from_slice(&face);
    }
    out
}

/// Font covering printable ASCII (0x20..=0x7E), 600 units wide except
/// a 250-unit space.
pub fn ascii_font() -> Vec<u8> {
    FontBuilder::new()
        .glyph(' ', 250)
        .glyphs('!'..='~', 600)
        .build()
}

/// ASCII plus Greek capitals and small letters, leaving U+03A2 (a
/// reserved codepoint) unmapped.
pub fn greek_font() -> Vec<u8> {
    FontBuilder::new()
        .family("Test Greek")
        .glyph(' ', 250)
        .glyphs('!'..='~', 600)
        .glyphs(('\u{391}'..='\u{3A9}').filter(|c| *c != '\u{3A2}'), 650)
        .glyphs('\u{3B1}'..='\u{3C9}', 550)
        .build()
}

/// A 128-byte ICC header (plus an empty tag table) with the given color
/// space and major version.
pub fn icc_profile(space: &[u8; 4], major_version: u8) -> Vec<u8> {
    let mut profile = vec![0u8; 132];
    profile[0..4].copy_from_slice(&132u32.to_be_bytes());
    profile[8] = major_version;
    profile[12..16].copy_from_slice(b"mntr");
    profile[16..20].copy_from_slice(space);
    profile[20..24].copy_from_slice(b"XYZ ");
    profile[36..40].copy_from_slice(b"acsp");
    profile
}

pub fn fixed_date() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 17, 9, 30, 0)
        .unwrap()
}
