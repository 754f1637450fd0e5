//! VisibilityState: the menu's plugin state slot
//!
//! A single boolean threaded through every editor state. Only a transaction
//! tagged with metadata under the menu's plugin key can set it; every other
//! transaction, even one that changes nothing, resets it to `false`.

use caret_core::{EditorState, PluginKey, StateField, Transaction};

/// Reducer for the `show_floating_menu` flag
#[derive(Clone, Debug)]
pub struct VisibilityState {
    key: PluginKey,
}

impl VisibilityState {
    /// Reducer reading metadata under `key`
    pub fn new(key: PluginKey) -> Self {
        Self { key }
    }

    /// The key whose metadata drives the flag
    pub fn key(&self) -> &PluginKey {
        &self.key
    }

    /// The next flag value for a transaction
    pub fn reduce(&self, tr: &Transaction) -> bool {
        tr.get_meta::<bool>(&self.key).copied().unwrap_or(false)
    }
}

impl StateField for VisibilityState {
    type Value = bool;

    fn init(&self, _state: &EditorState) -> bool {
        false
    }

    fn apply(&self, tr: &Transaction, value: &bool, _old: &EditorState, _new: &EditorState) -> bool {
        let next = self.reduce(tr);
        if next != *value {
            tracing::trace!(key = self.key.name(), show_floating_menu = next, "visibility changed");
        }
        next
    }
}

/// Read the flag from a state; `false` when the slot is not installed
pub fn show_floating_menu(state: &EditorState, key: &PluginKey) -> bool {
    key.get_state::<bool>(state).copied().unwrap_or(false)
}
