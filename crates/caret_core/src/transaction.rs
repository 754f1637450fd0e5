//! Transactions: batched document and selection edits with metadata

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::node::Node;
use crate::plugin::MetaKey;
use crate::schema::Schema;
use crate::selection::Selection;
use crate::state::EditorState;

/// A pending change to an [`EditorState`]
///
/// Created with [`EditorState::tr`], edited through the builder-style
/// methods below, then handed to [`EditorState::apply`] (usually through a
/// view's dispatch). Steps are applied eagerly, so [`Transaction::doc`]
/// always reflects every edit made so far.
pub struct Transaction {
    schema: Arc<Schema>,
    base_version: u64,
    before: Node,
    doc: Node,
    selection: Selection,
    meta: FxHashMap<MetaKey, Arc<dyn Any + Send + Sync>>,
    doc_changed: bool,
    selection_set: bool,
}

impl Transaction {
    pub(crate) fn new(state: &EditorState) -> Self {
        Self {
            schema: Arc::clone(state.schema()),
            base_version: state.version(),
            before: state.doc().clone(),
            doc: state.doc().clone(),
            selection: state.selection(),
            meta: FxHashMap::default(),
            doc_changed: false,
            selection_set: false,
        }
    }

    /// Version of the state this transaction was created from
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    /// The document before any step
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// The document after all steps so far
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    /// The schema of the document
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The selection after all steps so far
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Whether any step changed the document
    pub fn doc_changed(&self) -> bool {
        self.doc_changed
    }

    /// Whether the selection was set explicitly
    pub fn selection_set(&self) -> bool {
        self.selection_set
    }

    /// Insert text at `pos`
    ///
    /// A selection end at or after `pos` moves past the inserted text.
    pub fn insert_text(&mut self, pos: usize, text: &str) -> Result<&mut Self> {
        let len = text.chars().count();
        if len == 0 {
            return Ok(self);
        }
        let node = self.schema.text(text);
        self.doc = self.doc.insert_inline(pos, node)?;
        self.map_insert(pos, len);
        Ok(self)
    }

    /// Insert an inline node (mention, hard break, ...) at `pos`
    pub fn insert_inline(&mut self, pos: usize, node: Node) -> Result<&mut Self> {
        let size = node.node_size();
        self.doc = self.doc.insert_inline(pos, node)?;
        self.map_insert(pos, size);
        Ok(self)
    }

    /// Insert a block node between blocks at `pos`
    pub fn insert_block(&mut self, pos: usize, node: Node) -> Result<&mut Self> {
        let size = node.node_size();
        self.doc = self.doc.insert_block(pos, node)?;
        self.map_insert(pos, size);
        Ok(self)
    }

    /// Delete `from..to` inside one textblock
    ///
    /// Selection ends inside the deleted range collapse onto its start.
    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self> {
        let (from, to) = (from.min(to), from.max(to));
        if from == to {
            return Ok(self);
        }
        self.doc = self.doc.delete_text(from, to)?;
        let removed = to - from;
        self.selection = self.selection.map(|p| {
            if p >= to {
                p - removed
            } else if p > from {
                from
            } else {
                p
            }
        });
        self.doc_changed = true;
        Ok(self)
    }

    /// Replace the selection
    ///
    /// Positions are clamped into the current document.
    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = selection.clamp(self.doc.content_size());
        self.selection_set = true;
        self
    }

    /// Attach metadata
    pub fn set_meta<T>(&mut self, key: impl Into<MetaKey>, value: T) -> &mut Self
    where
        T: Any + Send + Sync,
    {
        self.meta.insert(key.into(), Arc::new(value));
        self
    }

    /// Read metadata of a given type
    ///
    /// Returns `None` when the key is absent or holds a different type.
    pub fn get_meta<T: Any>(&self, key: impl Into<MetaKey>) -> Option<&T> {
        self.meta.get(&key.into())?.downcast_ref::<T>()
    }

    /// Whether any metadata is stored under `key`
    pub fn has_meta(&self, key: impl Into<MetaKey>) -> bool {
        self.meta.contains_key(&key.into())
    }

    fn map_insert(&mut self, pos: usize, size: usize) {
        self.selection = self
            .selection
            .map(|p| if p >= pos { p + size } else { p });
        self.doc_changed = true;
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("base_version", &self.base_version)
            .field("doc", &self.doc)
            .field("selection", &self.selection)
            .field("meta", &self.meta.keys().collect::<Vec<_>>())
            .field("doc_changed", &self.doc_changed)
            .field("selection_set", &self.selection_set)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::test_docs::{doc, p};
    use crate::plugin::PluginKey;

    fn state(text: &str, cursor: usize) -> EditorState {
        let schema = Schema::basic();
        let d = doc(&schema, vec![p(&schema, text)]);
        EditorState::builder(schema)
            .doc(d)
            .selection(Selection::cursor(cursor))
            .build()
            .unwrap()
    }

    #[test]
    fn test_insert_moves_cursor() {
        let state = state("", 1);
        let mut tr = state.tr();
        tr.insert_text(1, "ab").unwrap();
        assert!(tr.doc_changed());
        assert_eq!(tr.doc().text_content(), "ab");
        assert_eq!(tr.selection(), Selection::cursor(3));
    }

    #[test]
    fn test_insert_after_cursor_keeps_it() {
        let state = state("abc", 2);
        let mut tr = state.tr();
        tr.insert_text(3, "x").unwrap();
        assert_eq!(tr.selection(), Selection::cursor(2));
    }

    #[test]
    fn test_delete_collapses_selection() {
        let state = state("hello", 4);
        let mut tr = state.tr();
        tr.delete(2, 6).unwrap();
        assert_eq!(tr.doc().text_content(), "h");
        assert_eq!(tr.selection(), Selection::cursor(2));
    }

    #[test]
    fn test_meta_round_trip() {
        let key = PluginKey::new("menu");
        let state = state("", 1);
        let mut tr = state.tr();
        tr.set_meta(&key, true).set_meta("addToHistory", false);
        assert_eq!(tr.get_meta::<bool>(&key), Some(&true));
        assert_eq!(tr.get_meta::<bool>("addToHistory"), Some(&false));
        assert_eq!(tr.get_meta::<u32>(&key), None);
        assert!(!tr.has_meta("pointer"));
        assert!(!tr.doc_changed());
    }

    #[test]
    fn test_set_selection_clamps() {
        let state = state("ab", 1);
        let mut tr = state.tr();
        tr.set_selection(Selection::range(1, 99));
        assert!(tr.selection_set());
        assert_eq!(tr.selection(), Selection::range(1, 4));
    }
}
