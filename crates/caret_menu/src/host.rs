//! Host collaborators: the menu element and the overlay library
//!
//! The controller drives both through these traits and never assumes a
//! particular toolkit. Overlay lifecycle notifications flow back through an
//! [`OverlayEvents`] queue that the controller drains after each call, so an
//! overlay may report `shown` from inside `show()` without re-entering the
//! controller.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use caret_platform::{DomEventKind, ElementId, FocusEvent, ListenerId, ListenerOptions, Rect};

use crate::config::OverlayOptions;

/// The element that carries the menu content
pub trait HostElement: Send + Sync {
    /// The element's id
    fn id(&self) -> ElementId;

    /// Whether the element is attached to a live document
    fn is_connected(&self) -> bool;

    /// Whether `target` is this element or one of its descendants
    fn contains(&self, target: ElementId) -> bool;

    /// Remove the element from its current parent
    fn detach(&self);

    /// Attach a listener; the host routes matching events to the controller
    fn add_listener(&self, kind: DomEventKind, options: ListenerOptions) -> ListenerId;

    /// Detach a listener
    fn remove_listener(&self, id: ListenerId);

    /// Focus the designated input inside the menu content
    fn focus_input(&self);
}

/// Props pushed to an overlay instance before showing
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverlayProps {
    /// Screen rectangle the overlay is anchored to
    pub reference_rect: Option<Rect>,
}

/// A positioned overlay created by the overlay library
pub trait OverlayInstance: Send {
    fn show(&mut self);

    fn hide(&mut self);

    fn set_props(&mut self, props: OverlayProps);

    /// Tear down, including any listener attached to the rendered content
    fn destroy(&mut self);

    fn is_destroyed(&self) -> bool;
}

/// Creates overlay instances for a host element
pub trait OverlayFactory: Send + Sync {
    fn create(
        &self,
        element: &Arc<dyn HostElement>,
        options: &OverlayOptions,
        events: OverlayEvents,
    ) -> Box<dyn OverlayInstance>;
}

impl<F> OverlayFactory for F
where
    F: Fn(&Arc<dyn HostElement>, &OverlayOptions, OverlayEvents) -> Box<dyn OverlayInstance>
        + Send
        + Sync,
{
    fn create(
        &self,
        element: &Arc<dyn HostElement>,
        options: &OverlayOptions,
        events: OverlayEvents,
    ) -> Box<dyn OverlayInstance> {
        self(element, options, events)
    }
}

/// Lifecycle notifications reported by an overlay instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayEvent {
    /// The overlay finished showing
    Shown,
    /// The overlay finished hiding
    Hidden,
    /// The overlay's rendered content lost focus
    ContentBlur(FocusEvent),
}

/// Queue an overlay instance reports its lifecycle into
///
/// Cloning shares the queue.
#[derive(Clone, Default)]
pub struct OverlayEvents {
    queue: Arc<Mutex<VecDeque<OverlayEvent>>>,
}

impl OverlayEvents {
    /// Report an event
    pub fn emit(&self, event: OverlayEvent) {
        self.lock().push_back(event);
    }

    /// Take the oldest pending event
    pub fn pop(&self) -> Option<OverlayEvent> {
        self.lock().pop_front()
    }

    /// Drop every pending event
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<OverlayEvent>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
