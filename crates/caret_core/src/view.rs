//! Editor views and plugin views
//!
//! [`EditorView`] is the surface a plugin view sees: the current state,
//! focus and composition flags, coordinates for document positions, and a
//! dispatch entry point. [`HeadlessView`] implements it without a rendering
//! backend, which is what hosts embed and what tests drive.
//!
//! Focus changes and state updates are queued and delivered after the call
//! that caused them returns, so a plugin view reacting to an update can
//! itself blur the editor or dispatch a transaction.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use caret_platform::{ElementId, FocusEvent, ListenerId, Rect};
use slotmap::SlotMap;

use crate::state::EditorState;
use crate::transaction::Transaction;

// ============================================================================
// Events
// ============================================================================

/// Editor-level events a plugin can subscribe to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditorEvent {
    /// The editing surface gained focus
    Focus,
    /// The editing surface lost focus
    Blur,
}

/// An event delivered to plugin views
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// The editing surface gained focus
    Focus(FocusEvent),
    /// The editing surface lost focus
    Blur(FocusEvent),
}

impl ViewEvent {
    /// The editor-level event kind
    pub fn kind(&self) -> EditorEvent {
        match self {
            ViewEvent::Focus(_) => EditorEvent::Focus,
            ViewEvent::Blur(_) => EditorEvent::Blur,
        }
    }
}

/// When a deferred task runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskPhase {
    /// After the current event has been fully processed
    Macrotask,
    /// Before the next frame is painted
    AnimationFrame,
}

/// Subscription registry for editor events
///
/// Cloning shares the registry.
#[derive(Clone, Default)]
pub struct EventHooks {
    listeners: Arc<Mutex<SlotMap<ListenerId, EditorEvent>>>,
}

impl EventHooks {
    /// Subscribe to an event
    pub fn on(&self, event: EditorEvent) -> ListenerId {
        self.lock().insert(event)
    }

    /// Unsubscribe; returns `false` if the id was not registered
    pub fn off(&self, id: ListenerId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Whether `id` is still subscribed
    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.lock().contains_key(id)
    }

    /// Number of subscriptions for `event`
    pub fn count(&self, event: EditorEvent) -> usize {
        self.lock().values().filter(|e| **e == event).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotMap<ListenerId, EditorEvent>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// What plugin views can see and do
pub trait EditorView {
    /// Current state
    fn state(&self) -> &EditorState;

    /// An IME composition is in progress
    fn composing(&self) -> bool;

    /// The editing surface has focus
    fn has_focus(&self) -> bool;

    /// The document accepts edits
    fn editable(&self) -> bool;

    /// The editing surface element
    fn dom(&self) -> ElementId;

    /// Move focus to the editing surface
    fn focus(&mut self);

    /// Remove focus from the editing surface
    fn blur(&mut self);

    /// Screen rectangle of a document position
    fn coords_at_pos(&self, pos: usize) -> Rect;

    /// Apply a transaction
    fn dispatch(&mut self, tr: Transaction);

    /// Editor event subscriptions
    fn hooks(&self) -> &EventHooks;
}

/// Bounding rectangle of the positions `from..to`
pub fn pos_to_rect(view: &dyn EditorView, from: usize, to: usize) -> Rect {
    let start = view.coords_at_pos(from);
    let end = view.coords_at_pos(to);
    start.union(&end)
}

/// Per-view companion object created by a plugin
pub trait PluginView: Send {
    /// Called after every state change
    fn update(&mut self, view: &mut dyn EditorView, prev_state: &EditorState);

    /// Called for editor focus changes
    fn handle_event(&mut self, _view: &mut dyn EditorView, _event: &ViewEvent) {}

    /// Run tasks deferred to `phase`
    fn run_deferred(&mut self, _view: &mut dyn EditorView, _phase: TaskPhase) {}

    /// Release every resource; must be idempotent
    fn destroy(&mut self);
}

// ============================================================================
// Headless view
// ============================================================================

/// Layout metrics used to fake screen coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    /// Left edge of the editing surface
    pub origin_x: f32,
    /// Top edge of the editing surface
    pub origin_y: f32,
    /// Width of one character
    pub char_width: f32,
    /// Height of one top-level block
    pub line_height: f32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            char_width: 8.0,
            line_height: 20.0,
        }
    }
}

enum Pending {
    Update(EditorState),
    Event(ViewEvent),
}

/// The part of a [`HeadlessView`] handed to plugin views
pub struct ViewCore {
    state: EditorState,
    dom: ElementId,
    focused: bool,
    composing: bool,
    editable: bool,
    metrics: TextMetrics,
    hooks: EventHooks,
    pending: VecDeque<Pending>,
}

impl ViewCore {
    fn push_focus_change(&mut self, focused: bool, event: FocusEvent) {
        if self.focused == focused {
            return;
        }
        self.focused = focused;
        let event = if focused {
            ViewEvent::Focus(event)
        } else {
            ViewEvent::Blur(event)
        };
        self.pending.push_back(Pending::Event(event));
    }
}

impl EditorView for ViewCore {
    fn state(&self) -> &EditorState {
        &self.state
    }

    fn composing(&self) -> bool {
        self.composing
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn editable(&self) -> bool {
        self.editable
    }

    fn dom(&self) -> ElementId {
        self.dom
    }

    fn focus(&mut self) {
        self.push_focus_change(true, FocusEvent::default());
    }

    fn blur(&mut self) {
        self.push_focus_change(false, FocusEvent::default());
    }

    fn coords_at_pos(&self, pos: usize) -> Rect {
        let doc = self.state.doc();
        let pos = pos.min(doc.content_size());
        let (block, column) = match doc.resolve(pos) {
            Ok(rpos) if rpos.depth() > 0 => (rpos.index(0), rpos.parent_offset()),
            Ok(rpos) => (rpos.index(0), 0),
            Err(_) => (0, 0),
        };
        Rect::new(
            self.metrics.origin_x + column as f32 * self.metrics.char_width,
            self.metrics.origin_y + block as f32 * self.metrics.line_height,
            0.0,
            self.metrics.line_height,
        )
    }

    fn dispatch(&mut self, tr: Transaction) {
        match self.state.apply(&tr) {
            Ok(next) => {
                let prev = std::mem::replace(&mut self.state, next);
                self.pending.push_back(Pending::Update(prev));
            }
            Err(err) => tracing::warn!(error = %err, "dropping transaction"),
        }
    }

    fn hooks(&self) -> &EventHooks {
        &self.hooks
    }
}

/// An editor view without a rendering backend
///
/// Owns the state, mounts plugin views, and delivers updates and focus
/// events to them. Hosts call [`HeadlessView::flush`] (or any of the
/// mutating helpers, which flush on return) to drain queued notifications,
/// and [`HeadlessView::run_macrotasks`] / [`HeadlessView::run_animation_frame`]
/// from their event loop.
pub struct HeadlessView {
    core: ViewCore,
    plugin_views: Vec<Box<dyn PluginView>>,
    destroyed: bool,
}

impl HeadlessView {
    /// Mount a view for `state`, creating every plugin's view
    pub fn new(state: EditorState, dom: ElementId) -> Self {
        Self::with_metrics(state, dom, TextMetrics::default())
    }

    /// Mount a view with custom layout metrics
    pub fn with_metrics(state: EditorState, dom: ElementId, metrics: TextMetrics) -> Self {
        let mut core = ViewCore {
            state,
            dom,
            focused: false,
            composing: false,
            editable: true,
            metrics,
            hooks: EventHooks::default(),
            pending: VecDeque::new(),
        };
        let factories: Vec<_> = core
            .state
            .plugins()
            .iter()
            .filter_map(|plugin| plugin.view_factory().cloned())
            .collect();
        let plugin_views = factories
            .iter()
            .map(|factory| factory(&mut core))
            .collect();

        let mut view = Self {
            core,
            plugin_views,
            destroyed: false,
        };
        view.flush();
        view
    }

    /// Current state
    pub fn state(&self) -> &EditorState {
        &self.core.state
    }

    /// The editing surface element
    pub fn dom(&self) -> ElementId {
        self.core.dom
    }

    pub fn has_focus(&self) -> bool {
        self.core.focused
    }

    pub fn hooks(&self) -> &EventHooks {
        &self.core.hooks
    }

    /// Apply a transaction and notify plugin views
    pub fn dispatch(&mut self, tr: Transaction) {
        self.core.dispatch(tr);
        self.flush();
    }

    /// Run `f` against the view, then deliver whatever it queued
    pub fn run<R>(&mut self, f: impl FnOnce(&mut dyn EditorView) -> R) -> R {
        let result = f(&mut self.core);
        self.flush();
        result
    }

    /// Focus the editing surface
    pub fn focus(&mut self) {
        self.core.focus();
        self.flush();
    }

    /// Blur the editing surface with focus going nowhere in particular
    pub fn blur(&mut self) {
        self.core.blur();
        self.flush();
    }

    /// Blur the editing surface with focus moving to `target`
    pub fn blur_to(&mut self, target: ElementId) {
        self.core
            .push_focus_change(false, FocusEvent::with_related(target));
        self.flush();
    }

    /// Start or end an IME composition
    pub fn set_composing(&mut self, composing: bool) {
        self.core.composing = composing;
    }

    /// Toggle whether the document accepts edits
    ///
    /// Like any view-prop change this re-runs plugin view updates.
    pub fn set_editable(&mut self, editable: bool) {
        if self.core.editable == editable {
            return;
        }
        self.core.editable = editable;
        let prev = self.core.state.clone();
        self.core.pending.push_back(Pending::Update(prev));
        self.flush();
    }

    /// Offer a key press to the plugin keymaps
    pub fn handle_key(&mut self, event: &caret_platform::KeyboardEvent) -> bool {
        let state = self.core.state.clone();
        let mut transactions = Vec::new();
        let handled = state.handle_key(event, Some(&mut |tr: Transaction| transactions.push(tr)));
        for tr in transactions {
            self.core.dispatch(tr);
        }
        self.flush();
        handled
    }

    /// Deliver queued updates and focus events to plugin views
    pub fn flush(&mut self) {
        while let Some(pending) = self.core.pending.pop_front() {
            if self.destroyed {
                continue;
            }
            match pending {
                Pending::Update(prev) => {
                    for plugin_view in self.plugin_views.iter_mut() {
                        plugin_view.update(&mut self.core, &prev);
                    }
                }
                Pending::Event(event) => {
                    for plugin_view in self.plugin_views.iter_mut() {
                        plugin_view.handle_event(&mut self.core, &event);
                    }
                }
            }
        }
    }

    /// Run tasks deferred until after the current event
    pub fn run_macrotasks(&mut self) {
        self.run_phase(TaskPhase::Macrotask);
    }

    /// Run tasks deferred until the next frame
    pub fn run_animation_frame(&mut self) {
        self.run_phase(TaskPhase::AnimationFrame);
    }

    fn run_phase(&mut self, phase: TaskPhase) {
        for plugin_view in self.plugin_views.iter_mut() {
            plugin_view.run_deferred(&mut self.core, phase);
        }
        self.flush();
    }

    /// Destroy every plugin view
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        for plugin_view in self.plugin_views.iter_mut() {
            plugin_view.destroy();
        }
        self.core.pending.clear();
    }
}

impl Drop for HeadlessView {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::plugin::{Plugin, PluginKey};
    use crate::schema::Schema;
    use crate::selection::Selection;

    #[derive(Default)]
    struct Log {
        updates: AtomicUsize,
        focus: AtomicUsize,
        blur: AtomicUsize,
        destroyed: AtomicUsize,
    }

    struct Recorder(Arc<Log>);

    impl PluginView for Recorder {
        fn update(&mut self, _view: &mut dyn EditorView, _prev: &EditorState) {
            self.0.updates.fetch_add(1, Ordering::SeqCst);
        }

        fn handle_event(&mut self, view: &mut dyn EditorView, event: &ViewEvent) {
            match event {
                ViewEvent::Focus(_) => {
                    self.0.focus.fetch_add(1, Ordering::SeqCst);
                    // re-entrant blur is queued, not delivered inline
                    view.blur();
                }
                ViewEvent::Blur(_) => {
                    self.0.blur.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        fn destroy(&mut self) {
            self.0.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn view_with_recorder() -> (HeadlessView, Arc<Log>) {
        let log = Arc::new(Log::default());
        let shared = Arc::clone(&log);
        let plugin = Plugin::new(PluginKey::new("recorder"))
            .with_view(move |_| Box::new(Recorder(Arc::clone(&shared))));
        let state = EditorState::builder(Schema::basic())
            .plugin(plugin)
            .build()
            .unwrap();
        (HeadlessView::new(state, ElementId::from_raw(1)), log)
    }

    #[test]
    fn test_dispatch_notifies_plugin_views() {
        let (mut view, log) = view_with_recorder();
        let mut tr = view.state().tr();
        tr.insert_text(1, "hi").unwrap();
        view.dispatch(tr);
        assert_eq!(view.state().doc().text_content(), "hi");
        assert_eq!(view.state().selection(), Selection::cursor(3));
        assert_eq!(log.updates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_focus_changes_are_queued() {
        let (mut view, log) = view_with_recorder();
        view.focus();
        assert_eq!(log.focus.load(Ordering::SeqCst), 1);
        assert_eq!(log.blur.load(Ordering::SeqCst), 1);
        assert!(!view.has_focus());
    }

    #[test]
    fn test_destroy_runs_once() {
        let (mut view, log) = view_with_recorder();
        view.destroy();
        drop(view);
        assert_eq!(log.destroyed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_hooks() {
        let hooks = EventHooks::default();
        let focus = hooks.on(EditorEvent::Focus);
        let _blur = hooks.on(EditorEvent::Blur);
        assert_eq!(hooks.count(EditorEvent::Focus), 1);
        assert!(hooks.off(focus));
        assert!(!hooks.off(focus));
        assert!(!hooks.is_subscribed(focus));
        assert_eq!(hooks.count(EditorEvent::Focus), 0);
    }

    #[test]
    fn test_coords_follow_blocks_and_columns() {
        let (mut view, _) = view_with_recorder();
        let mut tr = view.state().tr();
        tr.insert_text(1, "abc").unwrap();
        view.dispatch(tr);
        let rect = view.run(|v| pos_to_rect(v, 1, 3));
        assert_eq!(rect, Rect::new(0.0, 0.0, 16.0, 20.0));
    }
}
