//! Document schema: node types and their content rules
//!
//! A [`Schema`] is a registry of [`NodeType`]s keyed by name. The engine only
//! needs a handful of facts about each type: whether it is a block or inline
//! node, whether it holds inline content (a textblock), whether its content is
//! verbatim code, and how it renders to plain text when that is not obvious
//! from its children.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{EngineError, Result};
use crate::node::{Attrs, Node};

/// Custom plain-text rendering for a node type
///
/// Used for nodes whose text is not their text content, such as mentions,
/// hard breaks, or placeholder blocks.
pub type TextSerializer = Arc<dyn Fn(&Node) -> String + Send + Sync>;

/// What a node type may contain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Block children (doc, blockquote, list items)
    Blocks,
    /// Inline children (paragraphs, headings, code blocks)
    Inline,
    /// No children at all
    Leaf,
    /// Character data (the text node type)
    Text,
}

/// Declarative description of a node type, consumed by [`SchemaBuilder`]
#[derive(Clone)]
pub struct NodeSpec {
    /// Type name, unique within a schema
    pub name: String,
    /// Whether instances sit in block or inline position
    pub inline: bool,
    /// Allowed content
    pub content: ContentKind,
    /// Content is verbatim code (no marks, no input rules)
    pub code: bool,
    /// Optional custom plain-text rendering
    pub text_serializer: Option<TextSerializer>,
}

impl NodeSpec {
    /// A block node holding other blocks
    pub fn container(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inline: false,
            content: ContentKind::Blocks,
            code: false,
            text_serializer: None,
        }
    }

    /// A block node holding inline content
    pub fn textblock(name: impl Into<String>) -> Self {
        Self {
            content: ContentKind::Inline,
            ..Self::container(name)
        }
    }

    /// An inline node without children
    pub fn inline_leaf(name: impl Into<String>) -> Self {
        Self {
            inline: true,
            content: ContentKind::Leaf,
            ..Self::container(name)
        }
    }

    /// A block node without children
    pub fn block_leaf(name: impl Into<String>) -> Self {
        Self {
            content: ContentKind::Leaf,
            ..Self::container(name)
        }
    }

    /// Mark the content as verbatim code
    pub fn code(mut self, code: bool) -> Self {
        self.code = code;
        self
    }

    /// Set a custom plain-text serializer
    pub fn text_serializer<F>(mut self, f: F) -> Self
    where
        F: Fn(&Node) -> String + Send + Sync + 'static,
    {
        self.text_serializer = Some(Arc::new(f));
        self
    }
}

/// A node type registered in a [`Schema`]
pub struct NodeType {
    name: String,
    inline: bool,
    content: ContentKind,
    code: bool,
    text_serializer: Option<TextSerializer>,
}

impl NodeType {
    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text nodes hold character data directly
    pub fn is_text(&self) -> bool {
        self.content == ContentKind::Text
    }

    /// Inline nodes appear inside textblocks
    pub fn is_inline(&self) -> bool {
        self.inline
    }

    /// Block nodes are everything that is not inline
    pub fn is_block(&self) -> bool {
        !self.inline
    }

    /// A block whose content is inline
    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.content == ContentKind::Inline
    }

    /// Nodes that can never have content
    pub fn is_leaf(&self) -> bool {
        matches!(self.content, ContentKind::Leaf | ContentKind::Text)
    }

    /// Content is verbatim code
    pub fn is_code(&self) -> bool {
        self.code
    }

    /// Allowed content
    pub fn content(&self) -> ContentKind {
        self.content
    }

    /// Custom plain-text rendering, if the type declares one
    pub fn text_serializer(&self) -> Option<&TextSerializer> {
        self.text_serializer.as_ref()
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeType")
            .field("name", &self.name)
            .field("inline", &self.inline)
            .field("content", &self.content)
            .field("code", &self.code)
            .field("text_serializer", &self.text_serializer.is_some())
            .finish()
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for NodeType {}

/// Registry of node types
#[derive(Debug)]
pub struct Schema {
    nodes: FxHashMap<String, Arc<NodeType>>,
    top: String,
    text: String,
}

impl Schema {
    /// Look up a node type by name
    pub fn node_type(&self, name: &str) -> Result<&Arc<NodeType>> {
        self.nodes
            .get(name)
            .ok_or_else(|| EngineError::UnknownNodeType(name.to_string()))
    }

    /// The top-level node type
    pub fn top_node_type(&self) -> &Arc<NodeType> {
        &self.nodes[&self.top]
    }

    /// Create a node of the named type
    pub fn node(&self, name: &str, attrs: Attrs, content: Vec<Node>) -> Result<Node> {
        let node_type = self.node_type(name)?;
        Ok(Node::new(Arc::clone(node_type), attrs, content))
    }

    /// Create a text node
    pub fn text(&self, text: impl Into<String>) -> Node {
        Node::text(Arc::clone(&self.nodes[&self.text]), text)
    }

    /// Names of all node types that declare a custom text serializer
    pub fn text_serializer_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .nodes
            .values()
            .filter(|t| t.text_serializer.is_some())
            .map(|t| t.name())
            .collect();
        names.sort_unstable();
        names
    }

    /// The schema used by the headless editor and by tests
    ///
    /// Contains `doc`, `paragraph`, `heading`, `code_block`, `blockquote`,
    /// `horizontal_rule`, `text`, `hard_break`, `mention`, and
    /// `placeholder_block` (a textblock that renders as its `label` attr).
    pub fn basic() -> Arc<Schema> {
        SchemaBuilder::new("doc")
            .node(NodeSpec::container("doc"))
            .node(NodeSpec::textblock("paragraph"))
            .node(NodeSpec::textblock("heading"))
            .node(NodeSpec::textblock("code_block").code(true))
            .node(NodeSpec::container("blockquote"))
            .node(NodeSpec::block_leaf("horizontal_rule"))
            .node(NodeSpec::inline_leaf("hard_break").text_serializer(|_| "\n".to_string()))
            .node(NodeSpec::inline_leaf("mention").text_serializer(|node| {
                format!("@{}", node.attr("label").unwrap_or_default())
            }))
            .node(
                NodeSpec::textblock("placeholder_block")
                    .text_serializer(|node| node.attr("label").unwrap_or_default().to_string()),
            )
            .build()
    }
}

/// Builder for [`Schema`]
pub struct SchemaBuilder {
    top: String,
    specs: Vec<NodeSpec>,
}

impl SchemaBuilder {
    /// Start a schema whose top node has the given name
    pub fn new(top: impl Into<String>) -> Self {
        Self {
            top: top.into(),
            specs: Vec::new(),
        }
    }

    /// Register a node type
    pub fn node(mut self, spec: NodeSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Finish the schema
    ///
    /// A `text` type is added automatically, and the top node type is added
    /// as a block container if it was not registered explicitly.
    pub fn build(self) -> Arc<Schema> {
        let mut nodes = FxHashMap::default();
        for spec in self.specs {
            let node_type = NodeType {
                name: spec.name.clone(),
                inline: spec.inline,
                content: spec.content,
                code: spec.code,
                text_serializer: spec.text_serializer,
            };
            nodes.insert(spec.name, Arc::new(node_type));
        }
        nodes.entry("text".to_string()).or_insert_with(|| {
            Arc::new(NodeType {
                name: "text".to_string(),
                inline: true,
                content: ContentKind::Text,
                code: false,
                text_serializer: None,
            })
        });
        let top = self.top;
        nodes.entry(top.clone()).or_insert_with(|| {
            Arc::new(NodeType {
                name: top.clone(),
                inline: false,
                content: ContentKind::Blocks,
                code: false,
                text_serializer: None,
            })
        });

        Arc::new(Schema {
            nodes,
            top,
            text: "text".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_schema_flags() {
        let schema = Schema::basic();
        let paragraph = schema.node_type("paragraph").unwrap();
        assert!(paragraph.is_textblock());
        assert!(!paragraph.is_code());

        let code = schema.node_type("code_block").unwrap();
        assert!(code.is_textblock());
        assert!(code.is_code());

        let quote = schema.node_type("blockquote").unwrap();
        assert!(quote.is_block());
        assert!(!quote.is_textblock());

        assert!(schema.node_type("text").unwrap().is_text());
        assert!(schema.node_type("mention").unwrap().is_inline());
    }

    #[test]
    fn test_unknown_type() {
        let schema = Schema::basic();
        assert_eq!(
            schema.node_type("table").unwrap_err(),
            EngineError::UnknownNodeType("table".into())
        );
    }

    #[test]
    fn test_serializer_names() {
        let schema = Schema::basic();
        assert_eq!(
            schema.text_serializer_names(),
            vec!["hard_break", "mention", "placeholder_block"]
        );
    }
}
