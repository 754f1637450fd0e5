//! Immutable editor state snapshots

use std::any::Any;
use std::sync::Arc;

use caret_platform::KeyboardEvent;
use rustc_hash::FxHashMap;

use crate::command::reborrow;
use crate::error::{EngineError, Result};
use crate::node::{Attrs, Node};
use crate::plugin::{Plugin, PluginKey, SlotValue};
use crate::schema::Schema;
use crate::selection::Selection;
use crate::transaction::Transaction;

/// A document, a selection, and the values of every plugin slot
///
/// States are never mutated. [`EditorState::apply`] returns the next
/// snapshot; plugin slots are recomputed in registration order.
#[derive(Clone)]
pub struct EditorState {
    schema: Arc<Schema>,
    doc: Node,
    selection: Selection,
    plugins: Arc<[Plugin]>,
    slots: FxHashMap<u64, SlotValue>,
    version: u64,
}

impl EditorState {
    /// Start building a state for `schema`
    pub fn builder(schema: Arc<Schema>) -> EditorStateBuilder {
        EditorStateBuilder {
            schema,
            doc: None,
            selection: None,
            plugins: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Registered plugins, in order
    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Number of transactions applied since creation
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Start a transaction from this state
    pub fn tr(&self) -> Transaction {
        Transaction::new(self)
    }

    /// The value of a plugin's state slot
    pub fn plugin_state<T: Any>(&self, key: &PluginKey) -> Option<&T> {
        self.slots.get(&key.id())?.downcast_ref::<T>()
    }

    /// Apply a transaction, producing the next state
    pub fn apply(&self, tr: &Transaction) -> Result<EditorState> {
        if tr.base_version() != self.version {
            return Err(EngineError::MismatchedTransaction {
                state: self.version,
                base: tr.base_version(),
            });
        }

        let mut next = EditorState {
            schema: Arc::clone(&self.schema),
            doc: tr.doc().clone(),
            selection: tr.selection().clamp(tr.doc().content_size()),
            plugins: Arc::clone(&self.plugins),
            slots: FxHashMap::default(),
            version: self.version + 1,
        };
        for plugin in self.plugins.iter() {
            let Some(field) = plugin.state_field() else {
                continue;
            };
            let id = plugin.key().id();
            let value = match self.slots.get(&id) {
                Some(old) => field.apply(tr, old, self, &next),
                None => field.init(&next),
            };
            next.slots.insert(id, value);
        }

        tracing::trace!(
            version = next.version,
            doc_changed = tr.doc_changed(),
            selection_set = tr.selection_set(),
            "applied transaction"
        );
        Ok(next)
    }

    /// Offer a key press to every plugin keymap in order
    ///
    /// Stops at the first keymap that handles it.
    pub fn handle_key(
        &self,
        event: &KeyboardEvent,
        mut dispatch: Option<&mut dyn FnMut(Transaction)>,
    ) -> bool {
        self.plugins
            .iter()
            .any(|plugin| plugin.handle_key_down(self, event, reborrow(&mut dispatch)))
    }
}

impl std::fmt::Debug for EditorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorState")
            .field("doc", &self.doc)
            .field("selection", &self.selection)
            .field("plugins", &self.plugins.len())
            .field("version", &self.version)
            .finish()
    }
}

/// Builder for [`EditorState`]
pub struct EditorStateBuilder {
    schema: Arc<Schema>,
    doc: Option<Node>,
    selection: Option<Selection>,
    plugins: Vec<Plugin>,
}

impl EditorStateBuilder {
    /// Initial document (defaults to a single empty paragraph)
    pub fn doc(mut self, doc: Node) -> Self {
        self.doc = Some(doc);
        self
    }

    /// Initial selection (defaults to the start of the first textblock)
    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Register a plugin
    pub fn plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Register several plugins
    pub fn plugins(mut self, plugins: impl IntoIterator<Item = Plugin>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Build the state and initialise every plugin slot
    pub fn build(self) -> Result<EditorState> {
        let doc = match self.doc {
            Some(doc) => doc,
            None => default_doc(&self.schema)?,
        };
        let selection = self
            .selection
            .unwrap_or_else(|| Selection::cursor(first_text_position(&doc)));
        doc.resolve(selection.anchor())?;
        doc.resolve(selection.head())?;

        let mut state = EditorState {
            schema: self.schema,
            doc,
            selection,
            plugins: self.plugins.into(),
            slots: FxHashMap::default(),
            version: 0,
        };
        let plugins = Arc::clone(&state.plugins);
        for plugin in plugins.iter() {
            if let Some(field) = plugin.state_field() {
                let value = field.init(&state);
                state.slots.insert(plugin.key().id(), value);
            }
        }
        Ok(state)
    }
}

fn default_doc(schema: &Schema) -> Result<Node> {
    let top = schema.top_node_type().name().to_string();
    let content = match schema.node("paragraph", Attrs::default(), Vec::new()) {
        Ok(paragraph) => vec![paragraph],
        Err(EngineError::UnknownNodeType(_)) => Vec::new(),
        Err(err) => return Err(err),
    };
    schema.node(&top, Attrs::default(), content)
}

/// First position inside a textblock, or 0 when there is none
fn first_text_position(doc: &Node) -> usize {
    let mut found = None;
    doc.nodes_between(0, doc.content_size(), &mut |node, pos, _, _| {
        if found.is_some() {
            return false;
        }
        if node.is_textblock() {
            found = Some(pos + 1);
            return false;
        }
        true
    });
    found.unwrap_or(0)
}
