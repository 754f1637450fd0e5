//! Text selections

use crate::error::Result;
use crate::node::Node;
use crate::resolved::ResolvedPos;

/// An anchor/head pair of document positions
///
/// The anchor stays put while the head moves when a selection is extended.
/// A selection whose anchor equals its head is a collapsed caret.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    anchor: usize,
    head: usize,
}

impl Selection {
    /// A collapsed caret at `pos`
    pub fn cursor(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    /// A range selection
    pub fn range(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// The fixed end
    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// The moving end
    pub fn head(&self) -> usize {
        self.head
    }

    /// Lower bound
    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Upper bound
    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Whether the selection is a collapsed caret
    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Resolve the anchor in `doc`
    pub fn resolve_anchor(&self, doc: &Node) -> Result<ResolvedPos> {
        doc.resolve(self.anchor)
    }

    /// Resolve the upper bound in `doc`
    pub fn resolve_to(&self, doc: &Node) -> Result<ResolvedPos> {
        doc.resolve(self.to())
    }

    /// Map both ends through a position mapping
    pub fn map(&self, f: impl Fn(usize) -> usize) -> Self {
        Self {
            anchor: f(self.anchor),
            head: f(self.head),
        }
    }

    /// Clamp both ends into a document of the given content size
    pub fn clamp(&self, size: usize) -> Self {
        self.map(|pos| pos.min(size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_is_empty() {
        let sel = Selection::cursor(3);
        assert!(sel.is_empty());
        assert_eq!((sel.from(), sel.to()), (3, 3));
    }

    #[test]
    fn test_backward_range_bounds() {
        let sel = Selection::range(7, 2);
        assert!(!sel.is_empty());
        assert_eq!(sel.from(), 2);
        assert_eq!(sel.to(), 7);
        assert_eq!(sel.anchor(), 7);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Selection::range(1, 9).clamp(4), Selection::range(1, 4));
    }
}
