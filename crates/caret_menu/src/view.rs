//! FloatingMenuView: the overlay lifecycle controller
//!
//! One controller is mounted per editor view. It owns the host element's
//! listeners, the lazily created overlay instance, and the [`MenuState`]
//! machine, and it reconciles them on every view update:
//!
//! - **Update cycle**: composition skips everything; the overlay is created
//!   once the host element is connected; the show gate decides between
//!   anchoring + `show` and `hide`.
//! - **Focus races**: a mousedown inside the menu or the deliberate focus
//!   handoff sets `prevent_hide`, which vetoes exactly one blur.
//! - **Deferred work**: focus re-checks and the post-show focus handoff run
//!   from a [`DeferredQueue`] whose epoch is advanced on teardown.
//!
//! The handle is cheap to clone; the host keeps one to route element events
//! ([`FloatingMenuView::handle_mousedown`], [`FloatingMenuView::handle_keydown`])
//! while the editor view owns another as its plugin view.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use caret_core::{
    pos_to_rect, EditorEvent, EditorState, EditorView, EventHooks, PluginKey, PluginView,
    TaskPhase, Transaction, ViewEvent,
};
use caret_platform::{
    DomEventKind, ElementId, FocusEvent, KeyboardEvent, ListenerId, ListenerOptions, Rect,
};
use smallvec::{smallvec, SmallVec};

use crate::commands::set_float_menu;
use crate::config::OverlayOptions;
use crate::gate::{plugin_gate, should_show, ShouldShowProps, ShowPredicate};
use crate::host::{HostElement, OverlayEvent, OverlayEvents, OverlayFactory, OverlayInstance, OverlayProps};
use crate::machine::{menu_events, MenuState, StateTransitions};
use crate::scheduler::DeferredQueue;
use crate::visibility::show_floating_menu;

/// Overrides the caret rectangle the overlay is anchored to
pub type RectSource = Arc<dyn Fn(&dyn EditorView) -> Rect + Send + Sync>;

/// Resolved options shared by every controller a plugin mounts
pub(crate) struct ControllerConfig {
    pub key: PluginKey,
    pub element: Arc<dyn HostElement>,
    pub factory: Arc<dyn OverlayFactory>,
    pub overlay_options: OverlayOptions,
    pub predicate: ShowPredicate,
    pub rect_source: Option<RectSource>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Task {
    /// Re-run the update cycle once focus has settled
    Refresh,
    /// First half of the post-show handoff
    BlurEditor,
    /// Second half: hand focus to the menu's input
    FocusInput,
}

struct Controller {
    config: Arc<ControllerConfig>,
    editor_dom: ElementId,
    hooks: EventHooks,
    overlay: Option<Box<dyn OverlayInstance>>,
    events: OverlayEvents,
    state: MenuState,
    prevent_hide: bool,
    force_hide: bool,
    deferred: DeferredQueue<Task>,
    element_listeners: SmallVec<[ListenerId; 2]>,
    hook_listeners: SmallVec<[(EditorEvent, ListenerId); 2]>,
    destroyed: bool,
}

impl Controller {
    fn new(view: &mut dyn EditorView, config: Arc<ControllerConfig>) -> Self {
        let element = &config.element;
        element.detach();
        let element_listeners = smallvec![
            element.add_listener(DomEventKind::MouseDown, ListenerOptions::capture()),
            element.add_listener(DomEventKind::KeyDown, ListenerOptions::default()),
        ];

        let hooks = view.hooks().clone();
        let hook_listeners = smallvec![
            (EditorEvent::Focus, hooks.on(EditorEvent::Focus)),
            (EditorEvent::Blur, hooks.on(EditorEvent::Blur)),
        ];

        tracing::debug!(
            key = config.key.name(),
            element = ?element.id(),
            "mounted floating menu"
        );

        Self {
            editor_dom: view.dom(),
            config,
            hooks,
            overlay: None,
            events: OverlayEvents::default(),
            state: MenuState::Hidden,
            prevent_hide: false,
            force_hide: false,
            deferred: DeferredQueue::new(),
            element_listeners,
            hook_listeners,
            destroyed: false,
        }
    }

    fn is_subscribed(&self, event: EditorEvent) -> bool {
        self.hook_listeners
            .iter()
            .any(|(kind, id)| *kind == event && self.hooks.is_subscribed(*id))
    }

    // =========================================================================
    // Update cycle
    // =========================================================================

    fn update(&mut self, view: &mut dyn EditorView, old_state: Option<&EditorState>) {
        self.process_overlay_events();
        if self.destroyed {
            return;
        }
        if view.composing() {
            tracing::trace!("composition in progress, skipping update");
            return;
        }
        if !self.ensure_overlay() {
            return;
        }

        let view: &dyn EditorView = view;
        let state = view.state();

        // Once shown, focus has moved into the menu, so only the
        // focus-independent conditions can close it.
        if self.state.is_showing() {
            if !plugin_gate(state, &self.config.key, self.force_hide) {
                self.hide();
            }
            return;
        }

        let selection = state.selection();
        let props = ShouldShowProps {
            view,
            state,
            old_state,
            from: selection.from(),
            to: selection.to(),
        };
        if !should_show(&self.config.predicate, &self.config.key, self.force_hide, &props) {
            self.hide();
            return;
        }

        let rect = match &self.config.rect_source {
            Some(source) => source(view),
            None => pos_to_rect(view, selection.from(), selection.to()),
        };
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_props(OverlayProps {
                reference_rect: Some(rect),
            });
        }
        self.show();
    }

    /// Create the overlay instance once the host element is attached
    fn ensure_overlay(&mut self) -> bool {
        if let Some(overlay) = &self.overlay {
            if !overlay.is_destroyed() {
                return true;
            }
            tracing::debug!("overlay instance was destroyed externally, recreating");
            self.overlay = None;
            self.state = MenuState::Hidden;
        }
        if !self.config.element.is_connected() {
            tracing::trace!("host element not connected yet, deferring overlay creation");
            return false;
        }

        let overlay = self.config.factory.create(
            &self.config.element,
            &self.config.overlay_options,
            self.events.clone(),
        );
        tracing::debug!(key = self.config.key.name(), "created overlay instance");
        self.overlay = Some(overlay);
        true
    }

    fn show(&mut self) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        let Some(next) = self.state.on_event(menu_events::SHOW) else {
            return;
        };
        self.state = next;
        tracing::debug!(state = ?next, "showing floating menu");
        overlay.show();
        self.process_overlay_events();
    }

    fn hide(&mut self) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        let Some(next) = self.state.on_event(menu_events::HIDE) else {
            return;
        };
        self.state = next;
        tracing::debug!(state = ?next, "hiding floating menu");
        overlay.hide();
        self.process_overlay_events();
    }

    // =========================================================================
    // Overlay callbacks
    // =========================================================================

    fn process_overlay_events(&mut self) {
        while let Some(event) = self.events.pop() {
            if self.destroyed {
                continue;
            }
            match event {
                OverlayEvent::Shown => self.on_shown(),
                OverlayEvent::Hidden => self.on_hidden(),
                OverlayEvent::ContentBlur(focus) => self.on_blur(focus),
            }
        }
    }

    fn on_shown(&mut self) {
        if let Some(next) = self.state.on_event(menu_events::SHOWN) {
            self.state = next;
        }
        self.deferred.schedule(TaskPhase::Macrotask, Task::BlurEditor);
    }

    fn on_hidden(&mut self) {
        if let Some(next) = self.state.on_event(menu_events::HIDDEN) {
            self.state = next;
        }
    }

    // =========================================================================
    // Focus and input
    // =========================================================================

    fn on_focus(&mut self) {
        if self.destroyed {
            return;
        }
        self.deferred.schedule(TaskPhase::Macrotask, Task::Refresh);
    }

    fn on_blur(&mut self, event: FocusEvent) {
        if self.destroyed {
            return;
        }
        if self.prevent_hide {
            self.prevent_hide = false;
            tracing::debug!("blur vetoed by prevent_hide");
            return;
        }
        if let Some(related) = event.related_target {
            if related == self.editor_dom || self.config.element.contains(related) {
                return;
            }
        }
        self.hide();
    }

    fn on_mousedown(&mut self) {
        if !self.destroyed {
            self.prevent_hide = true;
        }
    }

    fn on_keydown(&mut self, view: &mut dyn EditorView, event: &KeyboardEvent) -> bool {
        if self.destroyed || !event.is_escape() {
            return false;
        }
        self.prevent_hide = true;
        self.hide();

        if show_floating_menu(view.state(), &self.config.key) {
            let close = set_float_menu(&self.config.key, false);
            let state = view.state().clone();
            close(&state, Some(&mut |tr: Transaction| view.dispatch(tr)));
        }
        view.focus();
        true
    }

    fn run_deferred(&mut self, view: &mut dyn EditorView, phase: TaskPhase) {
        for task in self.deferred.take_due(phase) {
            match task {
                Task::Refresh => self.update(view, None),
                Task::BlurEditor => {
                    if self.overlay.is_none() || !self.state.is_showing() {
                        tracing::trace!("menu no longer showing, skipping focus handoff");
                        continue;
                    }
                    self.prevent_hide = true;
                    view.blur();
                    self.deferred
                        .schedule(TaskPhase::AnimationFrame, Task::FocusInput);
                }
                Task::FocusInput => {
                    if self.overlay.is_none() {
                        continue;
                    }
                    self.prevent_hide = false;
                    self.config.element.focus_input();
                }
            }
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        for id in self.element_listeners.drain(..) {
            self.config.element.remove_listener(id);
        }
        for (_, id) in self.hook_listeners.drain(..) {
            self.hooks.off(id);
        }
        if let Some(mut overlay) = self.overlay.take() {
            overlay.destroy();
        }
        self.deferred.advance_epoch();
        self.events.clear();
        self.prevent_hide = false;
        self.state = MenuState::Hidden;

        tracing::debug!(key = self.config.key.name(), "destroyed floating menu");
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Handle to a mounted floating menu controller
#[derive(Clone)]
pub struct FloatingMenuView {
    inner: Arc<Mutex<Controller>>,
}

impl FloatingMenuView {
    pub(crate) fn new(view: &mut dyn EditorView, config: Arc<ControllerConfig>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Controller::new(view, config))),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakMenuView {
        WeakMenuView(Arc::downgrade(&self.inner))
    }

    fn lock(&self) -> MutexGuard<'_, Controller> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The plugin key the menu reads its flag from
    pub fn key(&self) -> PluginKey {
        self.lock().config.key.clone()
    }

    /// Run the update cycle
    pub fn update(&self, view: &mut dyn EditorView, old_state: Option<&EditorState>) {
        self.lock().update(view, old_state);
    }

    /// Mousedown on the host element (capture phase)
    pub fn handle_mousedown(&self) {
        self.lock().on_mousedown();
    }

    /// Keydown on the host element; returns `true` if the key was Escape
    pub fn handle_keydown(&self, view: &mut dyn EditorView, event: &KeyboardEvent) -> bool {
        self.lock().on_keydown(view, event)
    }

    /// The editor gained focus
    pub fn handle_focus(&self) {
        self.lock().on_focus();
    }

    /// The editor (or the overlay content) lost focus
    pub fn handle_blur(&self, event: FocusEvent) {
        self.lock().on_blur(event);
    }

    /// Apply lifecycle events the overlay reported since the last call
    pub fn process_overlay_events(&self) {
        self.lock().process_overlay_events();
    }

    /// Current machine state
    pub fn menu_state(&self) -> MenuState {
        self.lock().state
    }

    /// The overlay confirmed it is shown
    pub fn is_visible(&self) -> bool {
        self.lock().state.is_visible()
    }

    pub fn prevent_hide(&self) -> bool {
        self.lock().prevent_hide
    }

    pub fn force_hide(&self) -> bool {
        self.lock().force_hide
    }

    /// Force the gate closed (takes effect on the next update)
    pub fn set_force_hide(&self, force_hide: bool) {
        self.lock().force_hide = force_hide;
    }

    /// Whether the overlay instance has been created
    pub fn has_overlay(&self) -> bool {
        self.lock().overlay.is_some()
    }

    /// Number of queued deferred tasks, including ones invalidated by teardown
    pub fn pending_tasks(&self) -> usize {
        self.lock().deferred.len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }

    /// Tear everything down; safe to call repeatedly
    pub fn destroy(&self) {
        self.lock().destroy();
    }
}

/// Non-owning handle to a mounted controller
#[derive(Clone)]
pub(crate) struct WeakMenuView(Weak<Mutex<Controller>>);

impl WeakMenuView {
    pub(crate) fn upgrade(&self) -> Option<FloatingMenuView> {
        self.0.upgrade().map(|inner| FloatingMenuView { inner })
    }
}

impl PluginView for FloatingMenuView {
    fn update(&mut self, view: &mut dyn EditorView, prev_state: &EditorState) {
        FloatingMenuView::update(self, view, Some(prev_state));
    }

    fn handle_event(&mut self, _view: &mut dyn EditorView, event: &ViewEvent) {
        let mut controller = self.lock();
        if !controller.is_subscribed(event.kind()) {
            return;
        }
        match event {
            ViewEvent::Focus(_) => controller.on_focus(),
            ViewEvent::Blur(focus) => controller.on_blur(*focus),
        }
    }

    fn run_deferred(&mut self, view: &mut dyn EditorView, phase: TaskPhase) {
        self.lock().run_deferred(view, phase);
    }

    fn destroy(&mut self) {
        FloatingMenuView::destroy(self);
    }
}
