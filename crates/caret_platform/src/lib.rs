//! Caret Platform Abstraction Layer
//!
//! Platform-agnostic types shared by the editing engine and the menu
//! controller: keyboard input, key chords, element handles,
//! listener ids, focus events, and screen-space rectangles.
//!
//! Host integrations (a web binding, a native toolkit) translate their own
//! events into these types before handing them to the editor.
//!
//! # Example
//!
//! ```rust
//! use caret_platform::{Key, KeyChord, KeyboardEvent};
//!
//! let chord: KeyChord = "Escape".parse().unwrap();
//! assert!(chord.matches(&KeyboardEvent::pressed(Key::Escape)));
//! ```

mod error;
mod event;
mod geometry;
mod input;

// Re-export all public types
pub use error::{PlatformError, Result};
pub use event::{DomEventKind, ElementId, FocusEvent, ListenerId, ListenerOptions};
pub use geometry::Rect;
pub use input::{is_mac, Key, KeyChord, KeyState, KeyboardEvent, Modifiers};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{PlatformError, Result};
    pub use crate::event::{DomEventKind, ElementId, FocusEvent, ListenerId, ListenerOptions};
    pub use crate::geometry::Rect;
    pub use crate::input::{Key, KeyChord, KeyState, KeyboardEvent, Modifiers};
}
