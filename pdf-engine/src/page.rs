use crate::content::ContentStream;
use crate::objects::ObjId;

/// Page dimensions in points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// US Letter, portrait.
    pub const LETTER: PageSize = PageSize::new(612.0, 792.0);
    /// US Legal, portrait.
    pub const LEGAL: PageSize = PageSize::new(612.0, 1008.0);
    /// ISO A4, portrait.
    pub const A4: PageSize = PageSize::new(595.28, 841.89);

    pub const fn new(width: f64, height: f64) -> Self {
        PageSize { width, height }
    }

    /// The same size with width and height swapped.
    pub fn landscape(self) -> Self {
        PageSize {
            width: self.height,
            height: self.width,
        }
    }
}

/// A page and its content. Dimensions are fixed at creation; content
/// only grows.
#[derive(Debug, Clone)]
pub struct Page {
    pub(crate) size: PageSize,
    pub(crate) content: ContentStream,
    pub(crate) page_id: ObjId,
    pub(crate) content_id: ObjId,
}

impl Page {
    pub fn size(&self) -> PageSize {
        self.size
    }

    pub fn content(&self) -> &ContentStream {
        &self.content
    }

    pub fn object_id(&self) -> ObjId {
        self.page_id
    }
}
