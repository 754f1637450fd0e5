//! Caret Floating Menu
//!
//! A contextual menu that floats next to the caret when it rests in an empty
//! block:
//!
//! - **Visibility State**: a plugin slot holding `show_floating_menu`, set only
//!   by tagged transactions and reset by every other one
//! - **Commands**: `set_float_menu` plus the open (`Mod-/`) and close
//!   (`Escape`) bindings
//! - **Controller**: [`FloatingMenuView`] reconciles the flag with the overlay
//!   library's show/hide lifecycle and the editor's focus events
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use caret_core::{EditorState, HeadlessView, Schema, Transaction};
//! use caret_menu::prelude::*;
//! use caret_platform::{DomEventKind, ElementId, ListenerId, ListenerOptions};
//!
//! struct MenuElement;
//!
//! impl HostElement for MenuElement {
//!     fn id(&self) -> ElementId {
//!         ElementId::from_raw(7)
//!     }
//!     fn is_connected(&self) -> bool {
//!         false
//!     }
//!     fn contains(&self, target: ElementId) -> bool {
//!         target == self.id()
//!     }
//!     fn detach(&self) {}
//!     fn add_listener(&self, _: DomEventKind, _: ListenerOptions) -> ListenerId {
//!         ListenerId::default()
//!     }
//!     fn remove_listener(&self, _: ListenerId) {}
//!     fn focus_input(&self) {}
//! }
//!
//! fn no_overlay(
//!     _: &Arc<dyn HostElement>,
//!     _: &OverlayOptions,
//!     _: OverlayEvents,
//! ) -> Box<dyn OverlayInstance> {
//!     unreachable!("the element never connects")
//! }
//!
//! let plugin = FloatingMenuPlugin::new(
//!     FloatingMenuOptions::new(no_overlay).element(Arc::new(MenuElement)),
//! )
//! .unwrap();
//!
//! let state = EditorState::builder(Schema::basic())
//!     .plugin(plugin.plugin())
//!     .build()
//!     .unwrap();
//! let mut view = HeadlessView::new(state, ElementId::from_raw(1));
//!
//! let state = view.state().clone();
//! plugin.set_float_menu(true, &state, Some(&mut |tr: Transaction| view.dispatch(tr)));
//! assert!(show_floating_menu(view.state(), plugin.key()));
//! assert!(!plugin.mounted_view().unwrap().has_overlay());
//! ```

pub mod caret;
pub mod commands;
pub mod config;
pub mod error;
pub mod gate;
pub mod host;
pub mod machine;
pub mod plugin;
pub mod scheduler;
pub mod view;
pub mod visibility;

#[cfg(test)]
mod testing;

pub use caret::is_in_empty_textblock;
pub use commands::{
    close_float_menu, floating_menu_keymap, open_float_menu, set_float_menu, DEFAULT_CLOSE_KEY,
    DEFAULT_OPEN_KEY,
};
pub use config::{AppendTo, MenuConfig, OverlayOptions, Placement, DEFAULT_PLUGIN_NAME};
pub use error::{MenuError, Result};
pub use gate::{
    default_should_show, plugin_gate, should_show, ShouldShow, ShouldShowProps, ShowPredicate,
};
pub use host::{
    HostElement, OverlayEvent, OverlayEvents, OverlayFactory, OverlayInstance, OverlayProps,
};
pub use machine::{menu_events, MenuState, StateTransitions};
pub use plugin::{visibility_plugin, FloatingMenuOptions, FloatingMenuPlugin, PluginKeyOrName};
pub use scheduler::DeferredQueue;
pub use view::{FloatingMenuView, RectSource};
pub use visibility::{show_floating_menu, VisibilityState};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{MenuConfig, OverlayOptions, Placement};
    pub use crate::error::{MenuError, Result};
    pub use crate::host::{
        HostElement, OverlayEvents, OverlayFactory, OverlayInstance, OverlayProps,
    };
    pub use crate::plugin::{FloatingMenuOptions, FloatingMenuPlugin};
    pub use crate::view::FloatingMenuView;
    pub use crate::visibility::show_floating_menu;
}
