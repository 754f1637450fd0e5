//! Plugin factory
//!
//! [`FloatingMenuPlugin`] bundles the three pieces a host installs into an
//! editor state: the [`VisibilityState`] slot, the open/close keymap, and a
//! view factory that mounts a [`FloatingMenuView`] per editor view.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use caret_core::{EditorState, Plugin, PluginKey, Transaction};

use crate::commands::{floating_menu_keymap, set_float_menu, DEFAULT_CLOSE_KEY, DEFAULT_OPEN_KEY};
use crate::config::{MenuConfig, OverlayOptions, DEFAULT_PLUGIN_NAME};
use crate::error::{MenuError, Result};
use crate::gate::{ShouldShowProps, ShowPredicate};
use crate::host::{HostElement, OverlayFactory};
use crate::view::{ControllerConfig, FloatingMenuView, RectSource, WeakMenuView};
use crate::visibility::VisibilityState;

/// An existing plugin key, or a name to create a fresh one from
#[derive(Clone, Debug)]
pub enum PluginKeyOrName {
    Key(PluginKey),
    Name(String),
}

impl PluginKeyOrName {
    fn into_key(self) -> PluginKey {
        match self {
            PluginKeyOrName::Key(key) => key,
            PluginKeyOrName::Name(name) => PluginKey::new(&name),
        }
    }
}

impl Default for PluginKeyOrName {
    fn default() -> Self {
        PluginKeyOrName::Name(DEFAULT_PLUGIN_NAME.to_string())
    }
}

impl From<PluginKey> for PluginKeyOrName {
    fn from(key: PluginKey) -> Self {
        PluginKeyOrName::Key(key)
    }
}

impl From<&PluginKey> for PluginKeyOrName {
    fn from(key: &PluginKey) -> Self {
        PluginKeyOrName::Key(key.clone())
    }
}

impl From<&str> for PluginKeyOrName {
    fn from(name: &str) -> Self {
        PluginKeyOrName::Name(name.to_string())
    }
}

impl From<String> for PluginKeyOrName {
    fn from(name: String) -> Self {
        PluginKeyOrName::Name(name)
    }
}

/// Options for [`FloatingMenuPlugin::new`]
#[derive(Clone)]
pub struct FloatingMenuOptions {
    plugin_key: PluginKeyOrName,
    element: Option<Arc<dyn HostElement>>,
    factory: Arc<dyn OverlayFactory>,
    overlay_options: OverlayOptions,
    should_show: ShowPredicate,
    rect_source: Option<RectSource>,
    open_key: String,
    close_key: String,
}

impl FloatingMenuOptions {
    /// Defaults around an overlay factory; an element is still required
    pub fn new(factory: impl OverlayFactory + 'static) -> Self {
        Self {
            plugin_key: PluginKeyOrName::default(),
            element: None,
            factory: Arc::new(factory),
            overlay_options: OverlayOptions::floating_menu(),
            should_show: ShowPredicate::Always,
            rect_source: None,
            open_key: DEFAULT_OPEN_KEY.to_string(),
            close_key: DEFAULT_CLOSE_KEY.to_string(),
        }
    }

    /// Options taken from a loaded [`MenuConfig`]
    pub fn from_config(config: MenuConfig, factory: impl OverlayFactory + 'static) -> Self {
        Self::new(factory)
            .plugin_key(config.plugin_name)
            .overlay_options(config.overlay)
            .open_key(config.open_key)
            .close_key(config.close_key)
    }

    pub fn plugin_key(mut self, key: impl Into<PluginKeyOrName>) -> Self {
        self.plugin_key = key.into();
        self
    }

    /// The element carrying the menu content
    pub fn element(mut self, element: Arc<dyn HostElement>) -> Self {
        self.element = Some(element);
        self
    }

    pub fn overlay_options(mut self, options: OverlayOptions) -> Self {
        self.overlay_options = options;
        self
    }

    /// Decide with a host predicate once the plugin-level gate passes
    pub fn should_show<F>(mut self, f: F) -> Self
    where
        F: Fn(&ShouldShowProps<'_>) -> bool + Send + Sync + 'static,
    {
        self.should_show = ShowPredicate::custom(f);
        self
    }

    /// Show whenever the plugin-level gate passes; the default
    pub fn always_show(mut self) -> Self {
        self.should_show = ShowPredicate::Always;
        self
    }

    /// Also require focus, an editable view and a top-level empty block
    pub fn default_should_show(mut self) -> Self {
        self.should_show = ShowPredicate::Default;
        self
    }

    /// Anchor to a host-computed rectangle instead of the caret
    pub fn rect_source(mut self, source: RectSource) -> Self {
        self.rect_source = Some(source);
        self
    }

    pub fn open_key(mut self, chord: impl Into<String>) -> Self {
        self.open_key = chord.into();
        self
    }

    pub fn close_key(mut self, chord: impl Into<String>) -> Self {
        self.close_key = chord.into();
        self
    }
}

impl fmt::Debug for FloatingMenuOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatingMenuOptions")
            .field("plugin_key", &self.plugin_key)
            .field("element", &self.element.as_ref().map(|e| e.id()))
            .field("overlay_options", &self.overlay_options)
            .field("should_show", &self.should_show)
            .field("rect_source", &self.rect_source.is_some())
            .field("open_key", &self.open_key)
            .field("close_key", &self.close_key)
            .finish()
    }
}

/// The installable floating menu
pub struct FloatingMenuPlugin {
    key: PluginKey,
    plugin: Plugin,
    mounted: Arc<Mutex<Option<WeakMenuView>>>,
}

impl FloatingMenuPlugin {
    /// Validate options and build the plugin
    pub fn new(options: FloatingMenuOptions) -> Result<Self> {
        let element = options.element.ok_or(MenuError::MissingElement)?;
        let key = options.plugin_key.into_key();
        let keymap = floating_menu_keymap(&key, &options.open_key, &options.close_key)?;

        let config = Arc::new(ControllerConfig {
            key: key.clone(),
            element,
            factory: options.factory,
            overlay_options: options.overlay_options,
            predicate: options.should_show,
            rect_source: options.rect_source,
        });
        let mounted: Arc<Mutex<Option<WeakMenuView>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&mounted);
        let plugin = Plugin::new(key.clone())
            .with_state(VisibilityState::new(key.clone()))
            .with_keymap(keymap)
            .with_view(move |view| {
                let menu = FloatingMenuView::new(view, Arc::clone(&config));
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(menu.downgrade());
                Box::new(menu)
            });

        tracing::debug!(key = key.name(), "built floating menu plugin");
        Ok(Self {
            key,
            plugin,
            mounted,
        })
    }

    pub fn key(&self) -> &PluginKey {
        &self.key
    }

    /// The plugin to install into an editor state
    pub fn plugin(&self) -> Plugin {
        self.plugin.clone()
    }

    pub fn into_plugin(self) -> Plugin {
        self.plugin
    }

    /// The most recently mounted controller, while its view is alive
    ///
    /// Hosts keep this handle to route host-element events.
    pub fn mounted_view(&self) -> Option<FloatingMenuView> {
        self.mounted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(WeakMenuView::upgrade)
    }

    /// Toggle the menu on `state`; see [`set_float_menu`]
    pub fn set_float_menu(
        &self,
        visible: bool,
        state: &EditorState,
        dispatch: Option<&mut dyn FnMut(Transaction)>,
    ) -> bool {
        set_float_menu(&self.key, visible)(state, dispatch)
    }
}

impl fmt::Debug for FloatingMenuPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatingMenuPlugin")
            .field("key", &self.key)
            .field("plugin", &self.plugin)
            .finish()
    }
}

/// Just the visibility slot and keymap, for hosts that drive their own view
pub fn visibility_plugin(key: &PluginKey) -> Result<Plugin> {
    let keymap = floating_menu_keymap(key, DEFAULT_OPEN_KEY, DEFAULT_CLOSE_KEY)?;
    Ok(Plugin::new(key.clone())
        .with_state(VisibilityState::new(key.clone()))
        .with_keymap(keymap))
}
