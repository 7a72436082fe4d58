use std::collections::HashMap;
use std::io::{self, Read};
use std::path::Path;

use flate2::read::ZlibDecoder;

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur when reading a PDF file.
#[derive(Debug, PartialEq)]
pub enum PdfReadError {
    /// The bytes do not start with a valid `%PDF-` header.
    NotAPdf,
    /// The `startxref` keyword or its offset could not be found.
    StartxrefNotFound,
    /// The cross-reference table is missing or could not be parsed.
    MalformedXref,
    /// The trailer dictionary is missing or malformed.
    MalformedTrailer,
    /// The PDF uses a cross-reference stream (PDF 1.5+), which is not supported.
    XrefStreamNotSupported,
    /// An object reference could not be resolved (offset out of range or malformed).
    UnresolvableObject(u32),
    /// The page tree structure is invalid (missing /Count, /Pages or /Kids).
    MalformedPageTree,
    /// A stream object has no usable `/Length` or `stream` keyword.
    MalformedStream(u32),
    /// A stream filter other than `/FlateDecode`.
    UnsupportedFilter(String),
    /// Page index beyond the page count.
    PageOutOfRange(usize),
    /// An I/O error occurred while opening a file or inflating a stream.
    Io(String),
}

impl std::fmt::Display for PdfReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfReadError::NotAPdf => write!(f, "not a PDF file"),
            PdfReadError::StartxrefNotFound => write!(f, "startxref not found"),
            PdfReadError::MalformedXref => write!(f, "malformed or missing xref table"),
            PdfReadError::MalformedTrailer => write!(f, "malformed or missing trailer"),
            PdfReadError::XrefStreamNotSupported => {
                write!(f, "cross-reference streams (PDF 1.5+) are not supported")
            }
            PdfReadError::UnresolvableObject(n) => write!(f, "cannot resolve object {}", n),
            PdfReadError::MalformedPageTree => write!(f, "malformed page tree"),
            PdfReadError::MalformedStream(n) => write!(f, "malformed stream in object {}", n),
            PdfReadError::UnsupportedFilter(name) => write!(f, "unsupported filter {}", name),
            PdfReadError::PageOutOfRange(i) => write!(f, "page index {} out of range", i),
            PdfReadError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for PdfReadError {}

impl From<io::Error> for PdfReadError {
    fn from(e: io::Error) -> Self {
        PdfReadError::Io(e.to_string())
    }
}

// ── Public API ─────────────────────────────────────────────────────────────────

/// One `Tj` found in a page's content stream, with the font and text
/// position in effect when it was shown.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    /// Font resource name without the slash, e.g. `F1`.
    pub font: String,
    pub size: f64,
    pub x: f64,
    pub y: f64,
    /// String operand after hex or escape decoding. For Identity-H fonts
    /// these are big-endian glyph ids, two bytes each.
    pub bytes: Vec<u8>,
}

impl TextOp {
    /// Glyph ids of a two-byte (Identity-H) string.
    pub fn glyph_ids(&self) -> Vec<u16> {
        self.bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }
}

/// Reads a PDF file written with a classic xref table.
///
/// `PdfReader` parses the cross-reference table and trailer, resolves the
/// page list, and can decode each page's content stream to check what a
/// writer produced.
///
/// # Limitations
/// PDF 1.5+ cross-reference streams are not supported. Files that use them
/// return `PdfReadError::XrefStreamNotSupported`. Only flat page trees
/// (a single `/Pages` node) are walked.
pub struct PdfReader {
    data: Vec<u8>,
    /// Maps each object number to its byte offset in `data`.
    xref: HashMap<u32, usize>,
    trailer: HashMap<String, String>,
    version: String,
    page_count: usize,
    pages: Vec<u32>,
}

impl PdfReader {
    /// Open a PDF from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PdfReadError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Parse a PDF from raw bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, PdfReadError> {
        let version = parse_version(&data)?;
        let xref_offset = find_startxref(&data)?;
        let (xref, trailer) = parse_xref_and_trailer(&data, xref_offset)?;
        let root = trailer
            .get("Root")
            .and_then(|v| v.parse().ok())
            .ok_or(PdfReadError::MalformedTrailer)?;
        let (page_count, pages) = resolve_pages(&data, &xref, root)?;

        Ok(PdfReader {
            data,
            xref,
            trailer,
            version,
            page_count,
            pages,
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// PDF version string (e.g. `"1.7"`).
    pub fn pdf_version(&self) -> &str {
        &self.version
    }

    /// Number of entries the xref table marks in use.
    pub fn object_count(&self) -> usize {
        self.xref.len()
    }

    /// Byte offset the xref table records for an object.
    pub fn object_offset(&self, obj_num: u32) -> Option<usize> {
        self.xref.get(&obj_num).copied()
    }

    /// Whether the trailer carries an `/ID` array.
    pub fn has_file_id(&self) -> bool {
        self.trailer.contains_key("ID")
    }

    /// Object number of the `/Info` dictionary, if the trailer names one.
    pub fn info_object(&self) -> Option<u32> {
        self.trailer.get("Info").and_then(|v| v.parse().ok())
    }

    /// Flat `key → value` view of an object's dictionary. References
    /// become object numbers and arrays their inner text.
    pub fn object_dict(&self, obj_num: u32) -> Result<HashMap<String, String>, PdfReadError> {
        resolve_dict(&self.data, &self.xref, obj_num)
    }

    /// Decoded data of a stream object.
    pub fn stream_data(&self, obj_num: u32) -> Result<Vec<u8>, PdfReadError> {
        resolve_stream(&self.data, &self.xref, obj_num)
    }

    /// Text operations of one page, in content-stream order.
    pub fn page_text(&self, index: usize) -> Result<Vec<TextOp>, PdfReadError> {
        let page = *self
            .pages
            .get(index)
            .ok_or(PdfReadError::PageOutOfRange(index))?;
        let dict = resolve_dict(&self.data, &self.xref, page)?;
        let contents: u32 = dict
            .get("Contents")
            .and_then(|v| v.parse().ok())
            .ok_or(PdfReadError::MalformedPageTree)?;
        let content = resolve_stream(&self.data, &self.xref, contents)?;
        Ok(parse_text_ops(&content))
    }
}

// ── Internal parsing ───────────────────────────────────────────────────────────

/// Extract the PDF version from the `%PDF-x.y` header.
fn parse_version(data: &[u8]) -> Result<String, PdfReadError> {
    if data.len() < 8 || !data.starts_with(b"%PDF-") {
        return Err(PdfReadError::NotAPdf);
    }
    // Version is the characters after "%PDF-" up to the first whitespace.
    let rest = &data[5..];
    let end = rest
        .iter()
        .position(|&b| b == b'\n' || b == b'\r' || b == b' ')
        .unwrap_or(rest.len());
    let version = std::str::from_utf8(&rest[..end])
        .map(|s| s.to_string())
        .map_err(|_| PdfReadError::NotAPdf)?;
    Ok(version)
}

/// Scan backward from the end of the file to find the `startxref` offset.
///
/// `startxref\n{offset}\n%%EOF` sits near the end of the file; the last
/// 1024 bytes are searched to allow for comments or trailing whitespace.
fn find_startxref(data: &[u8]) -> Result<usize, PdfReadError> {
    let search_start = data.len().saturating_sub(1024);
    let tail = &data[search_start..];

    let keyword = b"startxref";
    let pos = tail
        .windows(keyword.len())
        .rposition(|w| w == keyword)
        .ok_or(PdfReadError::StartxrefNotFound)?;

    // The offset integer follows on the next line.
    let after = &tail[pos + keyword.len()..];
    let offset_str = skip_whitespace_to_token(after).ok_or(PdfReadError::StartxrefNotFound)?;
    let offset: usize = offset_str
        .parse()
        .map_err(|_| PdfReadError::StartxrefNotFound)?;

    if offset >= data.len() {
        return Err(PdfReadError::StartxrefNotFound);
    }

    Ok(offset)
}

type XrefMap = HashMap<u32, usize>;
type FlatDict = HashMap<String, String>;

/// Parse the xref table starting at `xref_offset` and the following trailer.
fn parse_xref_and_trailer(
    data: &[u8],
    xref_offset: usize,
) -> Result<(XrefMap, FlatDict), PdfReadError> {
    if xref_offset >= data.len() {
        return Err(PdfReadError::MalformedXref);
    }

    let section = &data[xref_offset..];

    // A cross-reference stream starts with "N 0 obj", not "xref".
    let trimmed = skip_ascii_whitespace(section);
    if !trimmed.starts_with(b"xref") {
        return Err(PdfReadError::XrefStreamNotSupported);
    }

    let xref = parse_xref_table(section)?;
    let trailer = parse_trailer(section)?;

    Ok((xref, trailer))
}

/// Parse the traditional xref table.
///
/// Each subsection has a header line `{first_obj} {count}` followed by
/// 20-byte fixed-width entries: `{offset:010} {gen:05} {n|f}\r\n`.
fn parse_xref_table(section: &[u8]) -> Result<XrefMap, PdfReadError> {
    let mut map = HashMap::new();

    let rest = skip_ascii_whitespace(consume_token(section, b"xref")?);

    let mut cursor = rest;
    loop {
        let trimmed = skip_ascii_whitespace(cursor);
        if trimmed.is_empty() || trimmed.starts_with(b"trailer") {
            break;
        }

        let (first_obj_str, after_first) =
            next_token(trimmed).ok_or(PdfReadError::MalformedXref)?;
        let first_obj: u32 = first_obj_str
            .parse()
            .map_err(|_| PdfReadError::MalformedXref)?;

        let after_first = skip_ascii_whitespace(after_first);
        let (count_str, after_count) =
            next_token(after_first).ok_or(PdfReadError::MalformedXref)?;
        let count: usize = count_str.parse().map_err(|_| PdfReadError::MalformedXref)?;

        let entries_start = skip_line(after_count);
        let entry_size = 20;

        if entries_start.len() < count * entry_size {
            return Err(PdfReadError::MalformedXref);
        }

        for i in 0..count {
            let entry = &entries_start[i * entry_size..(i + 1) * entry_size];
            // Byte 17: 'n' in use, 'f' free.
            if entry[17] == b'n' {
                let offset_str =
                    std::str::from_utf8(&entry[..10]).map_err(|_| PdfReadError::MalformedXref)?;
                let offset: usize = offset_str
                    .parse()
                    .map_err(|_| PdfReadError::MalformedXref)?;
                let obj_num = first_obj + i as u32;
                if obj_num > 0 {
                    map.insert(obj_num, offset);
                }
            }
        }

        cursor = &entries_start[count * entry_size..];
    }

    Ok(map)
}

fn parse_trailer(section: &[u8]) -> Result<FlatDict, PdfReadError> {
    let pos = section
        .windows(7)
        .position(|w| w == b"trailer")
        .ok_or(PdfReadError::MalformedTrailer)?;
    let after_trailer = skip_ascii_whitespace(&section[pos + 7..]);
    let (dict, _) = parse_dict_bytes(after_trailer).ok_or(PdfReadError::MalformedTrailer)?;
    if !dict.contains_key("Root") {
        return Err(PdfReadError::MalformedTrailer);
    }
    Ok(dict)
}

/// Follow catalog → pages to read `/Count` and the `/Kids` page objects.
fn resolve_pages(
    data: &[u8],
    xref: &XrefMap,
    catalog_obj_num: u32,
) -> Result<(usize, Vec<u32>), PdfReadError> {
    let catalog_dict = resolve_dict(data, xref, catalog_obj_num)?;

    let pages_obj_num: u32 = catalog_dict
        .get("Pages")
        .ok_or(PdfReadError::MalformedPageTree)?
        .parse()
        .map_err(|_| PdfReadError::MalformedPageTree)?;

    let pages_dict = resolve_dict(data, xref, pages_obj_num)?;

    let count: usize = pages_dict
        .get("Count")
        .ok_or(PdfReadError::MalformedPageTree)?
        .parse()
        .map_err(|_| PdfReadError::MalformedPageTree)?;
    let kids = pages_dict
        .get("Kids")
        .map(|k| parse_reference_list(k))
        .ok_or(PdfReadError::MalformedPageTree)?;
    if kids.len() != count {
        return Err(PdfReadError::MalformedPageTree);
    }

    Ok((count, kids))
}

/// Bytes just after an indirect object's `N G obj` header.
fn object_body<'a>(data: &'a [u8], xref: &XrefMap, obj_num: u32) -> Result<&'a [u8], PdfReadError> {
    let offset = xref
        .get(&obj_num)
        .copied()
        .ok_or(PdfReadError::UnresolvableObject(obj_num))?;

    if offset >= data.len() {
        return Err(PdfReadError::UnresolvableObject(obj_num));
    }

    let after_header =
        skip_obj_header(&data[offset..]).ok_or(PdfReadError::UnresolvableObject(obj_num))?;
    Ok(skip_ascii_whitespace(after_header))
}

/// Resolve an indirect object by number and parse its body as a dictionary.
fn resolve_dict(data: &[u8], xref: &XrefMap, obj_num: u32) -> Result<FlatDict, PdfReadError> {
    let body = object_body(data, xref, obj_num)?;
    parse_dict_bytes(body)
        .map(|(dict, _)| dict)
        .ok_or(PdfReadError::UnresolvableObject(obj_num))
}

/// Resolve a stream object and return its data, inflated when the
/// dictionary names `/FlateDecode`.
fn resolve_stream(data: &[u8], xref: &XrefMap, obj_num: u32) -> Result<Vec<u8>, PdfReadError> {
    let body = object_body(data, xref, obj_num)?;
    let (dict, rest) = parse_dict_bytes(body).ok_or(PdfReadError::UnresolvableObject(obj_num))?;

    let length: usize = dict
        .get("Length")
        .and_then(|v| v.parse().ok())
        .ok_or(PdfReadError::MalformedStream(obj_num))?;
    let rest = skip_ascii_whitespace(rest);
    if !rest.starts_with(b"stream") {
        return Err(PdfReadError::MalformedStream(obj_num));
    }
    // The keyword is followed by CRLF or LF only.
    let mut start = &rest[6..];
    if start.starts_with(b"\r\n") {
        start = &start[2..];
    } else if start.starts_with(b"\n") {
        start = &start[1..];
    }
    if start.len() < length {
        return Err(PdfReadError::MalformedStream(obj_num));
    }
    let raw = &start[..length];

    match dict.get("Filter").map(String::as_str) {
        None => Ok(raw.to_vec()),
        Some("/FlateDecode") => {
            let mut out = Vec::new();
            ZlibDecoder::new(raw).read_to_end(&mut out)?;
            Ok(out)
        }
        Some(other) => Err(PdfReadError::UnsupportedFilter(other.to_string())),
    }
}

/// `N G R N G R ...` → object numbers.
fn parse_reference_list(text: &str) -> Vec<u32> {
    let tokens: Vec<&str> = text.split_ascii_whitespace().collect();
    tokens
        .windows(3)
        .filter(|w| w[2] == "R")
        .filter_map(|w| w[0].parse().ok())
        .collect()
}

// ── Content streams ─────────────────────────────────────────────────────────────

enum Operand {
    Number(f64),
    Name(String),
    Bytes(Vec<u8>),
}

/// Walk a content stream and collect every `Tj` with the font set by
/// `Tf` and the position built up by `Td` since the last `BT`.
fn parse_text_ops(content: &[u8]) -> Vec<TextOp> {
    let mut ops = Vec::new();
    let mut operands: Vec<Operand> = Vec::new();
    let mut font = String::new();
    let mut size = 0.0;
    let (mut x, mut y) = (0.0, 0.0);

    let mut cursor = content;
    loop {
        cursor = skip_ascii_whitespace(cursor);
        let Some(&first) = cursor.first() else { break };
        match first {
            b'/' => {
                let (name, rest) = take_regular(&cursor[1..]);
                operands.push(Operand::Name(name));
                cursor = rest;
            }
            b'<' => {
                let end = cursor.iter().position(|&b| b == b'>').unwrap_or(cursor.len());
                operands.push(Operand::Bytes(decode_hex(&cursor[1..end])));
                cursor = &cursor[(end + 1).min(cursor.len())..];
            }
            b'(' => {
                let (bytes, rest) = decode_literal(cursor);
                operands.push(Operand::Bytes(bytes));
                cursor = rest;
            }
            _ => {
                let (token, rest) = take_regular(cursor);
                cursor = rest;
                if token.is_empty() {
                    // Stray delimiter.
                    cursor = &cursor[1..];
                    continue;
                }
                if let Ok(n) = token.parse::<f64>() {
                    operands.push(Operand::Number(n));
                    continue;
                }
                match token.as_str() {
                    "BT" => {
                        x = 0.0;
                        y = 0.0;
                    }
                    "Tf" => {
                        if let [.., Operand::Name(name), Operand::Number(s)] = operands.as_slice() {
                            font = name.clone();
                            size = *s;
                        }
                    }
                    "Td" => {
                        if let [.., Operand::Number(tx), Operand::Number(ty)] = operands.as_slice() {
                            x += tx;
                            y += ty;
                        }
                    }
                    "Tj" => {
                        if let Some(Operand::Bytes(bytes)) = operands.last() {
                            ops.push(TextOp {
                                font: font.clone(),
                                size,
                                x,
                                y,
                                bytes: bytes.clone(),
                            });
                        }
                    }
                    _ => {}
                }
                operands.clear();
            }
        }
    }
    ops
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'/' | b'<' | b'>' | b'(' | b')' | b'[' | b']')
}

/// Read regular characters up to the next delimiter.
fn take_regular(data: &[u8]) -> (String, &[u8]) {
    let end = data.iter().position(|&b| is_delimiter(b)).unwrap_or(data.len());
    (String::from_utf8_lossy(&data[..end]).into_owned(), &data[end..])
}

fn decode_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&b| (b as char).to_digit(16).map(|d| d as u8))
        .collect();
    // An odd final digit is padded with 0.
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

/// Decode a `(...)` string starting at `data[0] == b'('`, returning the
/// bytes and what follows the closing paren.
fn decode_literal(data: &[u8]) -> (Vec<u8>, &[u8]) {
    let mut out = Vec::new();
    let mut depth = 1;
    let mut i = 1;
    while i < data.len() {
        let b = data[i];
        i += 1;
        match b {
            b'\\' if i < data.len() => {
                let esc = data[i];
                i += 1;
                match esc {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'0'..=b'7' => {
                        let mut value = (esc - b'0') as u32;
                        let mut digits = 1;
                        while digits < 3 && i < data.len() && (b'0'..=b'7').contains(&data[i]) {
                            value = value * 8 + (data[i] - b'0') as u32;
                            i += 1;
                            digits += 1;
                        }
                        out.push(value as u8);
                    }
                    b'\n' => {}
                    other => out.push(other),
                }
            }
            b'(' => {
                depth += 1;
                out.push(b);
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                out.push(b);
            }
            _ => out.push(b),
        }
    }
    (out, &data[i.min(data.len())..])
}

// ── Token / byte utilities ─────────────────────────────────────────────────────

/// Parse `<<...>>` dictionary bytes into a flat `key → value` map and
/// return the bytes after the closing `>>`.
///
/// Indirect references (`N G R`) are stored as the object number, arrays
/// as their inner text, hex strings as their digits and literal strings
/// decoded. Nested dictionaries are skipped.
fn parse_dict_bytes(data: &[u8]) -> Option<(FlatDict, &[u8])> {
    let data = skip_ascii_whitespace(data);
    if !data.starts_with(b"<<") {
        return None;
    }

    let mut map = HashMap::new();
    let mut cursor = &data[2..];

    loop {
        cursor = skip_ascii_whitespace(cursor);

        if cursor.is_empty() {
            return None;
        }
        if cursor.starts_with(b">>") {
            cursor = &cursor[2..];
            break;
        }

        if !cursor.starts_with(b"/") {
            let (_, rest) = next_token(cursor)?;
            cursor = rest;
            continue;
        }

        let (key, after_key) = next_token(&cursor[1..])?;
        let key = key.to_string();
        cursor = skip_ascii_whitespace(after_key);

        if cursor.starts_with(b"<<") {
            cursor = skip_nested_dict(&cursor[2..])?;
        } else if cursor.starts_with(b"<") {
            let end = cursor.iter().position(|&b| b == b'>')?;
            let hex = std::str::from_utf8(&cursor[1..end]).ok()?;
            map.insert(key, hex.to_string());
            cursor = &cursor[end + 1..];
        } else if cursor.starts_with(b"[") {
            let (inner, rest) = split_array(cursor)?;
            map.insert(key, String::from_utf8_lossy(inner).into_owned());
            cursor = rest;
        } else if cursor.starts_with(b"(") {
            let (bytes, rest) = decode_literal(cursor);
            map.insert(key, String::from_utf8_lossy(&bytes).into_owned());
            cursor = rest;
        } else {
            let (val, rest) = next_token(cursor)?;
            let val = val.to_string();
            cursor = rest;

            // `N G R`: keep just N.
            if let Some((gen_str, after_gen)) = next_token(cursor) {
                if let Some((r_str, after_r)) = next_token(after_gen) {
                    if r_str == "R"
                        && val.chars().all(|c| c.is_ascii_digit())
                        && gen_str.chars().all(|c| c.is_ascii_digit())
                    {
                        cursor = after_r;
                    }
                }
            }
            map.insert(key, val);
        }
    }

    Some((map, cursor))
}

/// Skip the rest of a `<<...>>` block whose opening `<<` is already
/// consumed, returning bytes after the matching `>>`.
fn skip_nested_dict(data: &[u8]) -> Option<&[u8]> {
    let mut depth = 0usize;
    let mut i = 0;
    while i < data.len() {
        if data[i..].starts_with(b"<<") {
            depth += 1;
            i += 2;
        } else if data[i..].starts_with(b">>") {
            if depth == 0 {
                return Some(&data[i + 2..]);
            }
            depth -= 1;
            i += 2;
        } else if data[i] == b'(' {
            let rest = skip_literal_string(&data[i..])?;
            i = data.len() - rest.len();
        } else {
            i += 1;
        }
    }
    None
}

/// Split a `[...]` array (nesting allowed) into its inner bytes and the
/// bytes after the closing `]`.
fn split_array(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut depth = 0usize;
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&data[1..i], &data[i + 1..]));
                }
            }
            b'(' => {
                let rest = skip_literal_string(&data[i..])?;
                i = data.len() - rest.len();
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Skip over a `(...)` literal string (handles backslash escapes), returning bytes after `)`.
fn skip_literal_string(data: &[u8]) -> Option<&[u8]> {
    let mut i = 1;
    let mut depth = 1i32;
    while i < data.len() {
        match data[i] {
            b'\\' => i += 2,
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Some(&data[i..]);
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Skip "N G obj" indirect object header, returning bytes after "obj".
fn skip_obj_header(data: &[u8]) -> Option<&[u8]> {
    let (_, rest) = next_token(data)?; // object number
    let (_, rest) = next_token(rest)?; // generation number
    let (keyword, rest) = next_token(rest)?;
    if keyword != "obj" {
        return None;
    }
    Some(rest)
}

/// Return a sub-slice starting at the first non-whitespace byte.
fn skip_ascii_whitespace(data: &[u8]) -> &[u8] {
    let pos = data
        .iter()
        .position(|&b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    &data[pos..]
}

/// Skip to the end of the current line (past `\n` or `\r\n`).
fn skip_line(data: &[u8]) -> &[u8] {
    match data.iter().position(|&b| b == b'\n') {
        Some(pos) => &data[pos + 1..],
        None => &data[data.len()..],
    }
}

/// Consume a literal byte sequence at the start of `data`, returning the remainder.
fn consume_token<'a>(data: &'a [u8], token: &[u8]) -> Result<&'a [u8], PdfReadError> {
    let trimmed = skip_ascii_whitespace(data);
    if trimmed.starts_with(token) {
        Ok(&trimmed[token.len()..])
    } else {
        Err(PdfReadError::MalformedXref)
    }
}

/// Read the next whitespace-delimited token from `data`.
/// Returns `(token_str, remaining_bytes)` or `None` if at end.
fn next_token(data: &[u8]) -> Option<(&str, &[u8])> {
    let data = skip_ascii_whitespace(data);
    if data.is_empty() {
        return None;
    }
    let end = data
        .iter()
        .position(|&b| b.is_ascii_whitespace() || b == b'<' || b == b'>')
        .unwrap_or(data.len());
    if end == 0 {
        // Single delimiter character
        let token = std::str::from_utf8(&data[..1]).ok()?;
        return Some((token, &data[1..]));
    }
    let token = std::str::from_utf8(&data[..end]).ok()?;
    Some((token, &data[end..]))
}

/// Find the first non-whitespace token in `data` and parse it as a string.
fn skip_whitespace_to_token(data: &[u8]) -> Option<&str> {
    let (tok, _) = next_token(data)?;
    Some(tok)
}
