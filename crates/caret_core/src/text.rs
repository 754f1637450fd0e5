//! Plain-text serialization
//!
//! Node types may declare their own text rendering through
//! [`NodeSpec::text_serializer`](crate::schema::NodeSpec::text_serializer).
//! These helpers honour those serializers and fall back to character data
//! everywhere else.

use crate::node::Node;

/// Separator inserted between blocks by [`get_text`]
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Plain text of a node
///
/// A node with its own serializer renders through it; otherwise its
/// content is serialized with [`text_between`].
pub fn get_text(node: &Node) -> String {
    if let Some(serializer) = node.node_type().text_serializer() {
        return serializer(node);
    }
    text_between(node, 0, node.content_size(), BLOCK_SEPARATOR)
}

/// Plain text of `from..to` inside `node`'s content
///
/// Blocks are joined with `block_separator`. Nodes with a serializer are
/// rendered whole and their children skipped.
pub fn text_between(node: &Node, from: usize, to: usize, block_separator: &str) -> String {
    let mut text = String::new();
    let mut separated = true;

    node.nodes_between(from, to, &mut |child, pos, _, _| {
        if let Some(serializer) = child.node_type().text_serializer() {
            if child.is_block() && !separated {
                text.push_str(block_separator);
            }
            text.push_str(&serializer(child));
            separated = false;
            return false;
        }

        if let Some(chars) = child.text_str() {
            let start = from.max(pos) - pos;
            let end = to.min(pos + child.node_size()) - pos;
            text.push_str(crate::node::char_slice(chars, start, end));
            separated = false;
        } else if child.is_block() && !separated {
            text.push_str(block_separator);
            separated = true;
        }
        true
    });

    text
}
