//! Mock collaborators for the controller tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use caret_core::{
    Attrs, EditorState, EditorStateBuilder, HeadlessView, Node, PluginKey, Schema, Transaction,
};
use caret_platform::{
    DomEventKind, ElementId, Key, KeyboardEvent, ListenerId, ListenerOptions, Modifiers,
};
use slotmap::SlotMap;

use crate::config::OverlayOptions;
use crate::host::{
    HostElement, OverlayEvent, OverlayEvents, OverlayFactory, OverlayInstance, OverlayProps,
};
use crate::plugin::{FloatingMenuOptions, FloatingMenuPlugin};
use crate::view::FloatingMenuView;
use crate::visibility::show_floating_menu;

pub const EDITOR_DOM: ElementId = ElementId::from_raw(1);
pub const MENU_ELEMENT: ElementId = ElementId::from_raw(100);
pub const MENU_INPUT: ElementId = ElementId::from_raw(101);
pub const OUTSIDE: ElementId = ElementId::from_raw(500);

/// Route controller logs to the test harness; `RUST_LOG` filters them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Host element
// =============================================================================

pub struct MockElement {
    id: ElementId,
    descendants: Vec<ElementId>,
    connected: AtomicBool,
    listeners: Mutex<SlotMap<ListenerId, (DomEventKind, ListenerOptions)>>,
    pub detached: AtomicUsize,
    pub input_focused: AtomicUsize,
}

impl MockElement {
    pub fn new(connected: bool) -> Arc<Self> {
        Arc::new(Self {
            id: MENU_ELEMENT,
            descendants: vec![MENU_INPUT],
            connected: AtomicBool::new(connected),
            listeners: Mutex::new(SlotMap::with_key()),
            detached: AtomicUsize::new(0),
            input_focused: AtomicUsize::new(0),
        })
    }

    pub fn connect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    pub fn listeners(&self) -> Vec<(DomEventKind, ListenerOptions)> {
        self.listeners.lock().unwrap().values().copied().collect()
    }
}

impl HostElement for MockElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn contains(&self, target: ElementId) -> bool {
        target == self.id || self.descendants.contains(&target)
    }

    fn detach(&self) {
        self.detached.fetch_add(1, Ordering::SeqCst);
    }

    fn add_listener(&self, kind: DomEventKind, options: ListenerOptions) -> ListenerId {
        self.listeners.lock().unwrap().insert((kind, options))
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.lock().unwrap().remove(id);
    }

    fn focus_input(&self) {
        self.input_focused.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Overlay
// =============================================================================

/// Everything the mock overlays did, shared with the test
#[derive(Default)]
pub struct OverlayLog {
    pub created: AtomicUsize,
    pub shows: AtomicUsize,
    pub hides: AtomicUsize,
    pub destroys: AtomicUsize,
    pub props: Mutex<Vec<OverlayProps>>,
    pub options: Mutex<Option<OverlayOptions>>,
    /// Simulates the overlay library tearing the instance down on its own
    pub destroyed_externally: AtomicBool,
    events: Mutex<Option<OverlayEvents>>,
    /// Hold back `shown`/`hidden` until the test emits them
    pub manual_confirm: AtomicBool,
}

impl OverlayLog {
    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn hides(&self) -> usize {
        self.hides.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    pub fn last_props(&self) -> Option<OverlayProps> {
        self.props.lock().unwrap().last().copied()
    }

    /// Report an event from the latest instance
    pub fn emit(&self, event: OverlayEvent) {
        if let Some(events) = self.events.lock().unwrap().as_ref() {
            events.emit(event);
        }
    }
}

struct MockOverlay {
    log: Arc<OverlayLog>,
    events: OverlayEvents,
    destroyed: bool,
}

impl OverlayInstance for MockOverlay {
    fn show(&mut self) {
        self.log.shows.fetch_add(1, Ordering::SeqCst);
        if !self.log.manual_confirm.load(Ordering::SeqCst) {
            self.events.emit(OverlayEvent::Shown);
        }
    }

    fn hide(&mut self) {
        self.log.hides.fetch_add(1, Ordering::SeqCst);
        if !self.log.manual_confirm.load(Ordering::SeqCst) {
            self.events.emit(OverlayEvent::Hidden);
        }
    }

    fn set_props(&mut self, props: OverlayProps) {
        self.log.props.lock().unwrap().push(props);
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.log.destroys.fetch_add(1, Ordering::SeqCst);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed || self.log.destroyed_externally.load(Ordering::SeqCst)
    }
}

/// A factory producing [`MockOverlay`]s that report into `log`
pub fn mock_factory(log: Arc<OverlayLog>) -> impl OverlayFactory + 'static {
    move |_element: &Arc<dyn HostElement>, options: &OverlayOptions, events: OverlayEvents| {
        log.created.fetch_add(1, Ordering::SeqCst);
        log.destroyed_externally.store(false, Ordering::SeqCst);
        *log.options.lock().unwrap() = Some(options.clone());
        *log.events.lock().unwrap() = Some(events.clone());
        Box::new(MockOverlay {
            log: Arc::clone(&log),
            events,
            destroyed: false,
        }) as Box<dyn OverlayInstance>
    }
}

// =============================================================================
// Documents
// =============================================================================

pub fn paragraph(schema: &Schema, text: &str) -> Node {
    let content = if text.is_empty() {
        Vec::new()
    } else {
        vec![schema.text(text)]
    };
    schema.node("paragraph", Attrs::default(), content).unwrap()
}

pub fn doc(schema: &Schema, blocks: Vec<Node>) -> Node {
    schema.node("doc", Attrs::default(), blocks).unwrap()
}

// =============================================================================
// Harness
// =============================================================================

/// An editor view with a mounted floating menu
pub struct Harness {
    pub view: HeadlessView,
    pub menu: FloatingMenuView,
    pub element: Arc<MockElement>,
    pub overlay: Arc<OverlayLog>,
    pub key: PluginKey,
}

impl Harness {
    /// Default options, a single empty paragraph, element connected
    pub fn new() -> Self {
        Self::build(true, |options| options, |_, builder| builder)
    }

    pub fn build(
        connected: bool,
        configure: impl FnOnce(FloatingMenuOptions) -> FloatingMenuOptions,
        state: impl FnOnce(&Schema, EditorStateBuilder) -> EditorStateBuilder,
    ) -> Self {
        init_tracing();
        let element = MockElement::new(connected);
        let overlay = Arc::new(OverlayLog::default());
        let options = FloatingMenuOptions::new(mock_factory(Arc::clone(&overlay)))
            .element(element.clone());
        let plugin = FloatingMenuPlugin::new(configure(options)).unwrap();

        let schema = Schema::basic();
        let builder = EditorState::builder(Arc::clone(&schema)).plugin(plugin.plugin());
        let view = HeadlessView::new(state(&schema, builder).build().unwrap(), EDITOR_DOM);
        let menu = plugin.mounted_view().unwrap();

        Self {
            view,
            menu,
            element,
            overlay,
            key: plugin.key().clone(),
        }
    }

    /// The visibility flag in the current state
    pub fn flag(&self) -> bool {
        show_floating_menu(self.view.state(), &self.key)
    }

    pub fn press_open(&mut self) -> bool {
        let event = KeyboardEvent::pressed_with(Key::char('/'), Modifiers::primary());
        self.view.handle_key(&event)
    }

    /// Escape on the menu element
    pub fn escape_on_menu(&mut self) -> bool {
        let menu = self.menu.clone();
        let event = KeyboardEvent::pressed(Key::Escape);
        self.view.run(|view| menu.handle_keydown(view, &event))
    }

    /// Type at the caret through an ordinary transaction
    pub fn type_text(&mut self, text: &str) {
        let pos = self.view.state().selection().from();
        let mut tr: Transaction = self.view.state().tr();
        tr.insert_text(pos, text).unwrap();
        self.view.dispatch(tr);
    }

    /// Run one macrotask turn, then one animation frame
    pub fn settle(&mut self) {
        self.view.run_macrotasks();
        self.view.run_animation_frame();
    }

    /// Focus the editor and open the menu in the empty block
    pub fn focus_and_open(&mut self) {
        self.view.focus();
        assert!(self.press_open());
    }
}
