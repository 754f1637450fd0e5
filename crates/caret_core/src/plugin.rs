//! Plugins: keyed state slots, keymaps, and view factories
//!
//! A [`Plugin`] bundles up to three extension points under one process-unique
//! [`PluginKey`]:
//!
//! - a [`StateField`], a reducer whose value is threaded through every
//!   [`EditorState`] snapshot
//! - a [`Keymap`] consulted on key presses
//! - a view factory producing a [`PluginView`] when a view mounts
//!
//! The key doubles as the slot's address and as a transaction metadata key,
//! so a plugin can tag transactions for its own reducer.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use caret_platform::KeyboardEvent;

use crate::command::Keymap;
use crate::state::EditorState;
use crate::transaction::Transaction;
use crate::view::{EditorView, PluginView};

/// Next plugin key id (process-wide)
static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(0);

/// Type-erased slot value stored in an [`EditorState`]
pub(crate) type SlotValue = Arc<dyn Any + Send + Sync>;

/// Process-unique plugin identifier
///
/// Two keys created from the same name are still distinct. Equality and
/// hashing use the numeric id only.
#[derive(Clone)]
pub struct PluginKey {
    id: u64,
    name: Arc<str>,
}

impl PluginKey {
    /// Create a new unique key
    pub fn new(name: &str) -> Self {
        let id = NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            name: Arc::from(format!("{name}${id}")),
        }
    }

    /// Unique name, `"<name>$<id>"`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Read this plugin's slot from a state
    pub fn get_state<'a, T: Any>(&self, state: &'a EditorState) -> Option<&'a T> {
        state.plugin_state(self)
    }
}

impl PartialEq for PluginKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PluginKey {}

impl Hash for PluginKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for PluginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PluginKey({})", self.name)
    }
}

/// Key under which transaction metadata is stored
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MetaKey {
    /// Metadata owned by a plugin
    Plugin(u64),
    /// Free-form named metadata (`"addToHistory"`, `"pointer"`, ...)
    Named(Cow<'static, str>),
}

impl From<&PluginKey> for MetaKey {
    fn from(key: &PluginKey) -> Self {
        MetaKey::Plugin(key.id)
    }
}

impl From<&'static str> for MetaKey {
    fn from(name: &'static str) -> Self {
        MetaKey::Named(Cow::Borrowed(name))
    }
}

impl From<String> for MetaKey {
    fn from(name: String) -> Self {
        MetaKey::Named(Cow::Owned(name))
    }
}

/// A reducer-defined value threaded through every state snapshot
pub trait StateField: Send + Sync + 'static {
    /// Slot value type
    type Value: Send + Sync + 'static;

    /// Initial value when a state is created
    fn init(&self, state: &EditorState) -> Self::Value;

    /// Compute the next value from a transaction
    ///
    /// `new_state` already carries the transaction's document and selection;
    /// slots of plugins registered after this one are not yet filled in.
    fn apply(
        &self,
        tr: &Transaction,
        value: &Self::Value,
        old_state: &EditorState,
        new_state: &EditorState,
    ) -> Self::Value;
}

/// Object-safe view of a [`StateField`]
pub(crate) trait AnyStateField: Send + Sync {
    fn init(&self, state: &EditorState) -> SlotValue;
    fn apply(
        &self,
        tr: &Transaction,
        value: &SlotValue,
        old_state: &EditorState,
        new_state: &EditorState,
    ) -> SlotValue;
}

impl<F: StateField> AnyStateField for F {
    fn init(&self, state: &EditorState) -> SlotValue {
        Arc::new(StateField::init(self, state))
    }

    fn apply(
        &self,
        tr: &Transaction,
        value: &SlotValue,
        old_state: &EditorState,
        new_state: &EditorState,
    ) -> SlotValue {
        match value.downcast_ref::<F::Value>() {
            Some(value) => Arc::new(StateField::apply(self, tr, value, old_state, new_state)),
            None => {
                tracing::warn!("plugin slot held an unexpected type, reinitialising");
                Arc::new(StateField::init(self, new_state))
            }
        }
    }
}

/// Builds a plugin's view when an editor view mounts
pub type PluginViewFactory =
    Arc<dyn Fn(&mut dyn EditorView) -> Box<dyn PluginView> + Send + Sync>;

/// A bundle of extension points registered under one key
#[derive(Clone)]
pub struct Plugin {
    key: PluginKey,
    state: Option<Arc<dyn AnyStateField>>,
    keymap: Option<Arc<Keymap>>,
    view: Option<PluginViewFactory>,
}

impl Plugin {
    /// A plugin with no extension points yet
    pub fn new(key: PluginKey) -> Self {
        Self {
            key,
            state: None,
            keymap: None,
            view: None,
        }
    }

    /// Attach a state slot
    pub fn with_state<F: StateField>(mut self, field: F) -> Self {
        self.state = Some(Arc::new(field));
        self
    }

    /// Attach a keymap
    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = Some(Arc::new(keymap));
        self
    }

    /// Attach a view factory
    pub fn with_view<F>(mut self, factory: F) -> Self
    where
        F: Fn(&mut dyn EditorView) -> Box<dyn PluginView> + Send + Sync + 'static,
    {
        self.view = Some(Arc::new(factory));
        self
    }

    /// The plugin's key
    pub fn key(&self) -> &PluginKey {
        &self.key
    }

    pub(crate) fn state_field(&self) -> Option<&Arc<dyn AnyStateField>> {
        self.state.as_ref()
    }

    /// The view factory, if any
    pub fn view_factory(&self) -> Option<&PluginViewFactory> {
        self.view.as_ref()
    }

    /// Run the plugin's keymap against a key press
    pub fn handle_key_down(
        &self,
        state: &EditorState,
        event: &KeyboardEvent,
        dispatch: Option<&mut dyn FnMut(Transaction)>,
    ) -> bool {
        match &self.keymap {
            Some(keymap) => keymap.handle(state, event, dispatch),
            None => false,
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("key", &self.key)
            .field("state", &self.state.is_some())
            .field("keymap", &self.keymap.is_some())
            .field("view", &self.view.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique_per_instance() {
        let a = PluginKey::new("menu");
        let b = PluginKey::new("menu");
        assert_ne!(a, b);
        assert!(a.name().starts_with("menu$"));
        assert_ne!(a.name(), b.name());
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_meta_key_conversions() {
        let key = PluginKey::new("menu");
        assert_eq!(MetaKey::from(&key), MetaKey::Plugin(key.id()));
        assert_eq!(
            MetaKey::from("addToHistory"),
            MetaKey::from("addToHistory".to_string())
        );
    }
}
