//! Caret Core Engine
//!
//! The editing engine underneath the Caret editor components:
//!
//! - **Document Model**: immutable, schema-typed node trees with flat positions
//! - **Transactions**: batched edits carrying free-form metadata
//! - **Editor State**: snapshots threading plugin state slots through every change
//! - **Commands & Keymaps**: dry-runnable commands bound to key chords
//! - **Views**: the surface plugin views observe, plus a headless implementation
//!
//! # Example
//!
//! ```rust
//! use caret_core::{EditorState, Plugin, PluginKey, Schema, StateField, Transaction};
//!
//! struct Edits;
//!
//! impl StateField for Edits {
//!     type Value = usize;
//!
//!     fn init(&self, _state: &EditorState) -> usize {
//!         0
//!     }
//!
//!     fn apply(&self, tr: &Transaction, n: &usize, _: &EditorState, _: &EditorState) -> usize {
//!         n + usize::from(tr.doc_changed())
//!     }
//! }
//!
//! let key = PluginKey::new("edits");
//! let state = EditorState::builder(Schema::basic())
//!     .plugin(Plugin::new(key.clone()).with_state(Edits))
//!     .build()
//!     .unwrap();
//!
//! let mut tr = state.tr();
//! tr.insert_text(1, "hello").unwrap();
//! let state = state.apply(&tr).unwrap();
//!
//! assert_eq!(state.doc().text_content(), "hello");
//! assert_eq!(key.get_state::<usize>(&state), Some(&1));
//! ```

pub mod command;
pub mod error;
pub mod node;
pub mod plugin;
pub mod resolved;
pub mod schema;
pub mod selection;
pub mod state;
pub mod text;
pub mod transaction;
pub mod view;

pub use command::{chain_commands, command, reborrow, Command, Keymap};
pub use error::{EngineError, Result};
pub use node::{Attrs, Node};
pub use plugin::{MetaKey, Plugin, PluginKey, PluginViewFactory, StateField};
pub use resolved::ResolvedPos;
pub use schema::{ContentKind, NodeSpec, NodeType, Schema, SchemaBuilder, TextSerializer};
pub use selection::Selection;
pub use state::{EditorState, EditorStateBuilder};
pub use text::{get_text, text_between, BLOCK_SEPARATOR};
pub use transaction::Transaction;
pub use view::{
    pos_to_rect, EditorEvent, EditorView, EventHooks, HeadlessView, PluginView, TaskPhase,
    TextMetrics, ViewCore, ViewEvent,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::command::{command, Command, Keymap};
    pub use crate::error::{EngineError, Result};
    pub use crate::node::Node;
    pub use crate::plugin::{Plugin, PluginKey, StateField};
    pub use crate::schema::Schema;
    pub use crate::selection::Selection;
    pub use crate::state::EditorState;
    pub use crate::transaction::Transaction;
    pub use crate::view::{EditorView, HeadlessView, PluginView};
}
