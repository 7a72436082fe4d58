use std::fmt;

/// Object identifier: (object_number, generation_number).
/// Generation is always 0 for documents written by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub u32, pub u16);

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.0, self.1)
    }
}

/// PDF object types per PDF 32000-1:2008 Section 7.3.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Name object, stored without the leading `/`.
    Name(String),
    /// Literal string, stored unescaped without the enclosing parens.
    LiteralString(String),
    /// Hexadecimal string, written as `<...>`.
    HexString(Vec<u8>),
    Array(Vec<PdfObject>),
    /// Key-value pairs. A Vec keeps output order deterministic.
    Dictionary(Vec<(String, PdfObject)>),
    /// `/Length` is appended by the writer; `dict` must not carry it.
    Stream {
        dict: Vec<(String, PdfObject)>,
        data: Vec<u8>,
    },
    Reference(ObjId),
}

impl PdfObject {
    pub fn name(s: &str) -> Self {
        PdfObject::Name(s.to_string())
    }

    pub fn literal_string(s: &str) -> Self {
        PdfObject::LiteralString(s.to_string())
    }

    pub fn reference(id: ObjId) -> Self {
        PdfObject::Reference(id)
    }

    pub fn array(items: Vec<PdfObject>) -> Self {
        PdfObject::Array(items)
    }

    pub fn dict(entries: Vec<(&str, PdfObject)>) -> Self {
        PdfObject::Dictionary(own_entries(entries))
    }

    pub fn stream(dict_entries: Vec<(&str, PdfObject)>, data: Vec<u8>) -> Self {
        PdfObject::Stream {
            dict: own_entries(dict_entries),
            data,
        }
    }

    /// Array of numbers, the common shape of `/MediaBox` and `/FontBBox`.
    pub fn rect(values: [f64; 4]) -> Self {
        PdfObject::Array(values.iter().map(|&v| number(v)).collect())
    }

    /// Look up a dictionary (or stream dictionary) entry by key.
    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        let entries = match self {
            PdfObject::Dictionary(entries) => entries,
            PdfObject::Stream { dict, .. } => dict,
            _ => return None,
        };
        entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Collect every indirect reference held anywhere inside this object.
    pub fn collect_references(&self, out: &mut Vec<ObjId>) {
        match self {
            PdfObject::Reference(id) => out.push(*id),
            PdfObject::Array(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            PdfObject::Dictionary(entries) | PdfObject::Stream { dict: entries, .. } => {
                for (_, value) in entries {
                    value.collect_references(out);
                }
            }
            _ => {}
        }
    }
}

/// Integers stay integers so `/MediaBox [0 0 612 792]` reads naturally.
pub(crate) fn number(v: f64) -> PdfObject {
    if v == v.trunc() && v.abs() < 1e15 {
        PdfObject::Integer(v as i64)
    } else {
        PdfObject::Real(v)
    }
}

fn own_entries(entries: Vec<(&str, PdfObject)>) -> Vec<(String, PdfObject)> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
