//! Resolved positions
//!
//! A [`ResolvedPos`] turns a flat document position into the chain of
//! ancestors that contain it, so callers can ask "which block is the caret
//! in, and how deep is it?" without walking the tree themselves.

use smallvec::SmallVec;

use crate::error::{EngineError, Result};
use crate::node::Node;

#[derive(Clone, Debug)]
struct PathEntry {
    node: Node,
    index: usize,
    /// Absolute position where the child at `index` starts
    offset: usize,
}

/// A document position with its ancestry
#[derive(Clone, Debug)]
pub struct ResolvedPos {
    pos: usize,
    path: SmallVec<[PathEntry; 8]>,
    parent_offset: usize,
}

impl ResolvedPos {
    /// Resolve `pos` inside `doc`
    pub fn resolve(doc: &Node, pos: usize) -> Result<Self> {
        if pos > doc.content_size() {
            return Err(EngineError::PositionOutOfRange {
                pos,
                size: doc.content_size(),
            });
        }

        let mut path = SmallVec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc.clone();
        loop {
            let (index, offset) = node.find_index(parent_offset);
            let rem = parent_offset - offset;
            let child = node.child(index).cloned();
            path.push(PathEntry {
                node,
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            match child {
                Some(child) if !child.is_text() => {
                    node = child;
                    parent_offset = rem - 1;
                    start += offset + 1;
                }
                _ => break,
            }
        }

        Ok(Self {
            pos,
            path,
            parent_offset,
        })
    }

    /// The absolute position
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Nesting depth: 0 means directly inside the document node
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// Offset into the parent node's content
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    /// The ancestor at `depth`
    pub fn node(&self, depth: usize) -> &Node {
        &self.path[depth].node
    }

    /// The innermost ancestor
    pub fn parent(&self) -> &Node {
        self.node(self.depth())
    }

    /// The root document
    pub fn doc(&self) -> &Node {
        self.node(0)
    }

    /// Index of the child the position points into, at `depth`
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// Start of the content of the ancestor at `depth`
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    /// End of the content of the ancestor at `depth`
    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position directly before the ancestor at `depth` (`depth >= 1`)
    pub fn before(&self, depth: usize) -> Option<usize> {
        depth
            .checked_sub(1)
            .map(|parent_depth| self.path[parent_depth].offset)
    }

    /// Offset into the text node the position points into, 0 on boundaries
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.depth()].offset
    }

    /// The child the position points into or sits directly before
    pub fn node_after(&self) -> Option<&Node> {
        self.parent().child(self.index(self.depth()))
    }

    /// Whether both positions share the same parent node
    pub fn same_parent(&self, other: &ResolvedPos) -> bool {
        self.depth() == other.depth() && self.start(self.depth()) == other.start(other.depth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::test_docs::{doc, p};
    use crate::node::Attrs;
    use crate::schema::Schema;

    #[test]
    fn test_resolve_in_empty_paragraph() {
        let schema = Schema::basic();
        let d = doc(&schema, vec![p(&schema, "")]);
        let rpos = d.resolve(1).unwrap();
        assert_eq!(rpos.depth(), 1);
        assert_eq!(rpos.parent().type_name(), "paragraph");
        assert_eq!(rpos.parent_offset(), 0);
        assert_eq!(rpos.start(1), 1);
        assert_eq!(rpos.end(1), 1);
        assert_eq!(rpos.before(1), Some(0));
    }

    #[test]
    fn test_resolve_between_blocks() {
        let schema = Schema::basic();
        let d = doc(&schema, vec![p(&schema, "ab"), p(&schema, "cd")]);
        let rpos = d.resolve(4).unwrap();
        assert_eq!(rpos.depth(), 0);
        assert_eq!(rpos.index(0), 1);
        assert_eq!(rpos.text_offset(), 0);
        assert_eq!(rpos.node_after().unwrap().text_content(), "cd");
    }

    #[test]
    fn test_resolve_inside_text() {
        let schema = Schema::basic();
        let d = doc(&schema, vec![p(&schema, "ab"), p(&schema, "cd")]);
        let rpos = d.resolve(6).unwrap();
        assert_eq!(rpos.depth(), 1);
        assert_eq!(rpos.parent_offset(), 1);
        assert_eq!(rpos.start(1), 5);
        assert_eq!(rpos.text_offset(), 1);
    }

    #[test]
    fn test_resolve_nested() {
        let schema = Schema::basic();
        let quote = schema
            .node("blockquote", Attrs::default(), vec![p(&schema, "")])
            .unwrap();
        let d = doc(&schema, vec![quote]);
        let rpos = d.resolve(2).unwrap();
        assert_eq!(rpos.depth(), 2);
        assert_eq!(rpos.parent().type_name(), "paragraph");
        assert_eq!(rpos.node(1).type_name(), "blockquote");
    }

    #[test]
    fn test_out_of_range() {
        let schema = Schema::basic();
        let d = doc(&schema, vec![p(&schema, "")]);
        assert_eq!(
            d.resolve(3).unwrap_err(),
            EngineError::PositionOutOfRange { pos: 3, size: 2 }
        );
    }

    #[test]
    fn test_same_parent() {
        let schema = Schema::basic();
        let d = doc(&schema, vec![p(&schema, "ab"), p(&schema, "cd")]);
        let a = d.resolve(1).unwrap();
        let b = d.resolve(3).unwrap();
        let c = d.resolve(5).unwrap();
        assert!(a.same_parent(&b));
        assert!(!a.same_parent(&c));
    }
}
