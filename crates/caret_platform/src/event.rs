//! Element handles and DOM-style event descriptors

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a registered event listener
    pub struct ListenerId;
}

/// Opaque identifier of an element in the host's element tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Reconstruct an id from a raw value
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Event kinds a listener can be attached for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DomEventKind {
    /// Pointer button pressed
    MouseDown,
    /// Key pressed
    KeyDown,
    /// Element received focus
    Focus,
    /// Element lost focus
    Blur,
}

/// Options for attaching a listener
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    /// Run during the capture phase, before the event reaches its target
    pub capture: bool,
}

impl ListenerOptions {
    /// Capture-phase listener
    pub fn capture() -> Self {
        Self { capture: true }
    }
}

/// Focus change notification
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusEvent {
    /// Element gaining focus (for blur) or losing it (for focus), if any
    pub related_target: Option<ElementId>,
}

impl FocusEvent {
    /// Focus event with the given related target
    pub fn with_related(target: ElementId) -> Self {
        Self {
            related_target: Some(target),
        }
    }
}
