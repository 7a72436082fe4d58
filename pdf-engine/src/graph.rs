//! Object arena. Every PDF object the document will write is allocated
//! here when the entity it belongs to is created; the number it gets is
//! final. Entities refer to each other by [`ObjId`], never by pointer,
//! so page → font → descriptor links carry no ownership.

use std::fmt;

use crate::objects::ObjId;

/// Handle to a font attached to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontHandle(pub usize);

/// Handle to a page of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageHandle(pub usize);

impl fmt::Display for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font #{}", self.0)
    }
}

impl fmt::Display for PageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page #{}", self.0)
    }
}

/// What an allocated object will be serialized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Catalog,
    PageTree,
    Info,
    Page(PageHandle),
    Contents(PageHandle),
    /// Composite font dictionary of an embedded program.
    Type0Font(FontHandle),
    CidFont(FontHandle),
    FontDescriptor(FontHandle),
    FontFile(FontHandle),
    ToUnicode(FontHandle),
    /// Non-embedded standard font.
    SimpleFont(FontHandle),
    Metadata,
    IccProfile,
}

/// Monotonic id allocator plus the kind of every allocated object.
/// Object number `n` lives at index `n - 1`; numbers are never reused.
#[derive(Debug, Clone, Default)]
pub struct ObjectGraph {
    nodes: Vec<NodeKind>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        ObjectGraph { nodes: Vec::new() }
    }

    pub fn allocate(&mut self, kind: NodeKind) -> ObjId {
        self.nodes.push(kind);
        let id = ObjId(self.nodes.len() as u32, 0);
        log::trace!("allocated {} for {:?}", id, kind);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All objects in increasing id order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjId, NodeKind)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, kind)| (ObjId(i as u32 + 1, 0), *kind))
    }
}
