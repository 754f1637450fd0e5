//! Immutable document nodes
//!
//! Nodes are cheap to clone (`Arc` inside) and never mutated in place; every
//! edit returns a new tree that shares untouched subtrees with the old one.
//!
//! Positions follow the usual flat-token scheme: entering or leaving a
//! non-leaf node costs one position, each character of text costs one, and a
//! leaf node costs one.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{EngineError, Result};
use crate::resolved::ResolvedPos;
use crate::schema::{ContentKind, NodeType};

/// Node attributes
pub type Attrs = FxHashMap<String, String>;

#[derive(PartialEq)]
struct NodeInner {
    node_type: Arc<NodeType>,
    attrs: Attrs,
    content: Vec<Node>,
    text: Option<String>,
    content_size: usize,
}

/// A node in the document tree
#[derive(Clone, PartialEq)]
pub struct Node(Arc<NodeInner>);

impl Node {
    /// Create a non-text node
    pub fn new(node_type: Arc<NodeType>, attrs: Attrs, content: Vec<Node>) -> Self {
        let content = if node_type.is_leaf() {
            Vec::new()
        } else {
            normalize_text(content)
        };
        let content_size = content.iter().map(Node::node_size).sum();
        Self(Arc::new(NodeInner {
            node_type,
            attrs,
            content,
            text: None,
            content_size,
        }))
    }

    /// Create a text node
    pub fn text(node_type: Arc<NodeType>, text: impl Into<String>) -> Self {
        let text = text.into();
        let content_size = text.chars().count();
        Self(Arc::new(NodeInner {
            node_type,
            attrs: Attrs::default(),
            content: Vec::new(),
            text: Some(text),
            content_size,
        }))
    }

    /// The node's type
    pub fn node_type(&self) -> &Arc<NodeType> {
        &self.0.node_type
    }

    /// The node's type name
    pub fn type_name(&self) -> &str {
        self.0.node_type.name()
    }

    /// All attributes
    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    /// A single attribute
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.0.attrs.get(name).map(String::as_str)
    }

    /// Character data of a text node
    pub fn text_str(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    /// Direct children
    pub fn children(&self) -> &[Node] {
        &self.0.content
    }

    /// Child at `index`
    pub fn child(&self, index: usize) -> Option<&Node> {
        self.0.content.get(index)
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.0.content.len()
    }

    pub fn is_text(&self) -> bool {
        self.0.node_type.is_text()
    }

    pub fn is_inline(&self) -> bool {
        self.0.node_type.is_inline()
    }

    pub fn is_block(&self) -> bool {
        self.0.node_type.is_block()
    }

    pub fn is_textblock(&self) -> bool {
        self.0.node_type.is_textblock()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.node_type.is_leaf()
    }

    /// Size of the node's content in positions
    pub fn content_size(&self) -> usize {
        self.0.content_size
    }

    /// Size of the whole node in positions
    pub fn node_size(&self) -> usize {
        match self.0.node_type.content() {
            ContentKind::Text => self.0.content_size,
            ContentKind::Leaf => 1,
            ContentKind::Blocks | ContentKind::Inline => self.0.content_size + 2,
        }
    }

    /// Concatenated character data of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.0.text {
            out.push_str(text);
        }
        for child in &self.0.content {
            child.collect_text(out);
        }
    }

    /// Resolve a position inside this node's content
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos> {
        ResolvedPos::resolve(self, pos)
    }

    /// Find the child covering `offset` in this node's content
    ///
    /// Returns `(index, child_start)`. An offset on a boundary between two
    /// children resolves to the child after it.
    pub(crate) fn find_index(&self, offset: usize) -> (usize, usize) {
        if offset == 0 {
            return (0, 0);
        }
        let mut cur = 0;
        for (i, child) in self.0.content.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= offset {
                if end == offset {
                    return (i + 1, end);
                }
                return (i, cur);
            }
            cur = end;
        }
        (self.0.content.len(), cur)
    }

    /// Visit every descendant overlapping `from..to` (relative to this
    /// node's content), depth first
    ///
    /// The callback receives the node, its absolute position (offset by
    /// `start`), its parent, and its index in the parent. Returning `false`
    /// skips that node's children.
    pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.nodes_between_at(from, to, 0, f);
    }

    fn nodes_between_at<F>(&self, from: usize, to: usize, start: usize, f: &mut F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        let mut pos = 0;
        for (i, child) in self.0.content.iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, start + pos, self, i) && !child.is_leaf() {
                let inner = pos + 1;
                child.nodes_between_at(
                    from.saturating_sub(inner),
                    child.content_size().min(to.saturating_sub(inner)),
                    start + inner,
                    f,
                );
            }
            pos = end;
        }
    }

    /// Copy of this node with different content
    pub fn with_content(&self, content: Vec<Node>) -> Node {
        Node::new(
            Arc::clone(&self.0.node_type),
            self.0.attrs.clone(),
            content,
        )
    }

    /// Copy of this node with the child at `index` replaced
    pub fn replace_child(&self, index: usize, node: Node) -> Node {
        let mut content = self.0.content.clone();
        content[index] = node;
        self.with_content(content)
    }

    /// Insert an inline node (usually text) at a position inside a textblock
    ///
    /// Adjacent text nodes are merged, so inserting text into a word yields a
    /// single text node.
    pub fn insert_inline(&self, pos: usize, inline: Node) -> Result<Node> {
        let rpos = self.resolve(pos)?;
        let parent = rpos.parent();
        if !parent.is_textblock() || !inline.is_inline() {
            return Err(EngineError::NotInTextblock(pos));
        }
        let offset = rpos.parent_offset();

        let mut content = Vec::with_capacity(parent.child_count() + 2);
        let mut pending = Some(inline);
        let mut cur = 0;
        for child in parent.children() {
            let end = cur + child.node_size();
            if cur == offset {
                content.extend(pending.take());
            }
            match (child.text_str(), pending.take()) {
                (Some(existing), Some(node)) if cur < offset && offset < end => {
                    let node_type = child.node_type();
                    content.push(Node::text(
                        Arc::clone(node_type),
                        char_slice(existing, 0, offset - cur),
                    ));
                    content.push(node);
                    content.push(Node::text(
                        Arc::clone(node_type),
                        char_slice(existing, offset - cur, end - cur),
                    ));
                }
                (_, node) => {
                    pending = node;
                    content.push(child.clone());
                }
            }
            cur = end;
        }
        content.extend(pending);

        Ok(self.rebuild_path(&rpos, rpos.depth(), parent.with_content(content)))
    }

    /// Delete `from..to`, which must lie inside a single textblock
    pub fn delete_text(&self, from: usize, to: usize) -> Result<Node> {
        let (from, to) = (from.min(to), from.max(to));
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        let depth = rfrom.depth();
        if !rfrom.same_parent(&rto) {
            return Err(EngineError::CrossesBlocks { from, to });
        }
        let parent = rfrom.parent();
        if !parent.is_textblock() {
            return Err(EngineError::NotInTextblock(from));
        }
        let (lo, hi) = (rfrom.parent_offset(), rto.parent_offset());

        let mut content = Vec::with_capacity(parent.child_count());
        let mut cur = 0;
        for child in parent.children() {
            let end = cur + child.node_size();
            if end <= lo || cur >= hi {
                content.push(child.clone());
            } else if let Some(existing) = child.text_str() {
                let keep_head = char_slice(existing, 0, lo.saturating_sub(cur));
                let keep_tail = char_slice(existing, hi.min(end) - cur, end - cur);
                let kept = format!("{keep_head}{keep_tail}");
                if !kept.is_empty() {
                    content.push(Node::text(Arc::clone(child.node_type()), kept));
                }
            }
            cur = end;
        }

        Ok(self.rebuild_path(&rfrom, depth, parent.with_content(content)))
    }

    /// Insert a block node at a position between blocks
    pub fn insert_block(&self, pos: usize, node: Node) -> Result<Node> {
        let rpos = self.resolve(pos)?;
        let parent = rpos.parent();
        if parent.node_type().content() != ContentKind::Blocks || rpos.text_offset() != 0 {
            return Err(EngineError::NotInTextblock(pos));
        }
        let mut content = parent.children().to_vec();
        content.insert(rpos.index(rpos.depth()), node);
        Ok(self.rebuild_path(&rpos, rpos.depth(), parent.with_content(content)))
    }

    /// Replace the node at `depth` along `rpos`'s path and rebuild ancestors
    fn rebuild_path(&self, rpos: &ResolvedPos, depth: usize, replacement: Node) -> Node {
        let mut node = replacement;
        for d in (0..depth).rev() {
            node = rpos.node(d).replace_child(rpos.index(d), node);
        }
        node
    }

}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.0.text {
            return write!(f, "{text:?}");
        }
        write!(f, "{}", self.type_name())?;
        if !self.0.content.is_empty() {
            f.debug_list().entries(self.0.content.iter()).finish()?;
        }
        Ok(())
    }
}

/// Merge adjacent text nodes and drop empty ones
fn normalize_text(content: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(content.len());
    for node in content {
        if let Some(text) = node.text_str() {
            if text.is_empty() {
                continue;
            }
            if let Some(prev) = out.last_mut() {
                if let Some(prev_text) = prev.text_str() {
                    let merged = format!("{prev_text}{text}");
                    *prev = Node::text(Arc::clone(prev.node_type()), merged);
                    continue;
                }
            }
        }
        out.push(node);
    }
    out
}

/// Slice a string by character offsets
pub(crate) fn char_slice(s: &str, from: usize, to: usize) -> &str {
    let start = s.char_indices().nth(from).map_or(s.len(), |(i, _)| i);
    let end = s.char_indices().nth(to).map_or(s.len(), |(i, _)| i);
    &s[start..end.max(start)]
}
