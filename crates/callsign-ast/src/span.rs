//! Byte-offset source spans.

/// Half-open byte range into the original source text.
///
/// Nodes synthesized by the optimizer carry a dummy span until they are
/// attached, at which point they inherit the span of the node they replace
/// or extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Span for nodes that have no source position yet.
    pub fn dummy() -> Self {
        Span { start: 0, end: 0 }
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::dummy()
    }
}
