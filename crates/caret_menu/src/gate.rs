//! Show/hide decision
//!
//! Two layers decide whether the menu appears. The plugin-level gate is
//! fixed: the visibility flag must be set, the selection collapsed, and the
//! caret in an empty textblock. Only then is the configured predicate asked.
//! With no predicate configured the menu shows; [`default_should_show`] is
//! the stricter focus/editable/top-level check a host can opt into.

use std::fmt;
use std::sync::Arc;

use caret_core::{EditorState, EditorView, PluginKey};

use crate::caret::is_in_empty_textblock;
use crate::visibility::show_floating_menu;

/// Everything a show predicate may look at
pub struct ShouldShowProps<'a> {
    pub view: &'a dyn EditorView,
    pub state: &'a EditorState,
    pub old_state: Option<&'a EditorState>,
    /// Selection start
    pub from: usize,
    /// Selection end
    pub to: usize,
}

/// Host-supplied show predicate
pub type ShouldShow = Arc<dyn Fn(&ShouldShowProps<'_>) -> bool + Send + Sync>;

/// Which predicate runs after the plugin-level gate passes
#[derive(Clone, Default)]
pub enum ShowPredicate {
    /// Always show once the plugin-level gate passes
    #[default]
    Always,
    /// [`default_should_show`]
    Default,
    /// A host-supplied predicate, replacing the default entirely
    Custom(ShouldShow),
}

impl ShowPredicate {
    /// Wrap a closure
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&ShouldShowProps<'_>) -> bool + Send + Sync + 'static,
    {
        ShowPredicate::Custom(Arc::new(f))
    }

    pub fn evaluate(&self, props: &ShouldShowProps<'_>) -> bool {
        match self {
            ShowPredicate::Default => default_should_show(props),
            ShowPredicate::Always => true,
            ShowPredicate::Custom(f) => f(props),
        }
    }
}

impl fmt::Debug for ShowPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShowPredicate::Default => f.write_str("Default"),
            ShowPredicate::Always => f.write_str("Always"),
            ShowPredicate::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Focused, editable, collapsed caret in an empty top-level textblock
pub fn default_should_show(props: &ShouldShowProps<'_>) -> bool {
    let view = props.view;
    let selection = props.state.selection();
    if !view.has_focus() || !selection.is_empty() || !view.editable() {
        return false;
    }
    match selection.resolve_anchor(props.state.doc()) {
        Ok(anchor) => anchor.depth() == 1 && is_in_empty_textblock(&anchor),
        Err(_) => false,
    }
}

/// The focus-independent part of the decision
///
/// Flag set, not force-hidden, selection collapsed, caret in an empty
/// textblock.
pub fn plugin_gate(state: &EditorState, key: &PluginKey, force_hide: bool) -> bool {
    let selection = state.selection();
    if force_hide || !selection.is_empty() || !show_floating_menu(state, key) {
        return false;
    }
    selection
        .resolve_anchor(state.doc())
        .map(|anchor| is_in_empty_textblock(&anchor))
        .unwrap_or(false)
}

/// Plugin-level gate, then the configured predicate
pub fn should_show(
    predicate: &ShowPredicate,
    key: &PluginKey,
    force_hide: bool,
    props: &ShouldShowProps<'_>,
) -> bool {
    plugin_gate(props.state, key, force_hide) && predicate.evaluate(props)
}

#[cfg(test)]
mod tests {
    use caret_core::{Attrs, HeadlessView, Plugin, Schema, Selection};
    use caret_platform::ElementId;

    use super::*;
    use crate::visibility::VisibilityState;

    struct Setup {
        key: PluginKey,
        view: HeadlessView,
    }

    fn setup(texts: &[&str], cursor: usize, flag: bool) -> Setup {
        let key = PluginKey::new("floatingMenu");
        let schema = Schema::basic();
        let blocks = texts
            .iter()
            .map(|text| {
                let content = if text.is_empty() {
                    vec![]
                } else {
                    vec![schema.text(*text)]
                };
                schema.node("paragraph", Attrs::default(), content).unwrap()
            })
            .collect();
        let doc = schema.node("doc", Attrs::default(), blocks).unwrap();
        let state = EditorState::builder(schema)
            .doc(doc)
            .selection(Selection::cursor(cursor))
            .plugin(Plugin::new(key.clone()).with_state(VisibilityState::new(key.clone())))
            .build()
            .unwrap();
        let mut view = HeadlessView::new(state, ElementId::from_raw(1));
        if flag {
            let mut tr = view.state().tr();
            tr.set_meta(&key, true);
            view.dispatch(tr);
        }
        view.focus();
        Setup { key, view }
    }

    fn check(setup: &mut Setup, predicate: &ShowPredicate, force_hide: bool) -> bool {
        let key = setup.key.clone();
        setup.view.run(|view| {
            let view: &dyn EditorView = view;
            let state = view.state();
            let props = ShouldShowProps {
                view,
                state,
                old_state: None,
                from: state.selection().from(),
                to: state.selection().to(),
            };
            should_show(predicate, &key, force_hide, &props)
        })
    }

    #[test]
    fn test_all_conditions_hold() {
        let mut s = setup(&[""], 1, true);
        assert!(check(&mut s, &ShowPredicate::Default, false));
    }

    #[test]
    fn test_flag_required() {
        let mut s = setup(&[""], 1, false);
        assert!(!check(&mut s, &ShowPredicate::Default, false));
        assert!(!check(&mut s, &ShowPredicate::Always, false));
    }

    #[test]
    fn test_force_hide_wins() {
        let mut s = setup(&[""], 1, true);
        assert!(!check(&mut s, &ShowPredicate::Always, true));
    }

    #[test]
    fn test_selection_must_be_collapsed() {
        let mut s = setup(&["", "ab"], 1, false);
        let mut tr = s.view.state().tr();
        tr.set_selection(Selection::range(1, 5)).set_meta(&s.key, true);
        s.view.dispatch(tr);
        assert!(!check(&mut s, &ShowPredicate::Always, false));
    }

    #[test]
    fn test_block_must_be_empty() {
        let mut s = setup(&["ab"], 2, true);
        assert!(!check(&mut s, &ShowPredicate::Always, false));
    }

    #[test]
    fn test_focus_required_by_default_only() {
        let mut s = setup(&[""], 1, true);
        s.view.blur();
        assert!(!check(&mut s, &ShowPredicate::Default, false));
        assert!(check(&mut s, &ShowPredicate::Always, false));
    }

    #[test]
    fn test_editable_required_by_default_only() {
        let mut s = setup(&[""], 1, true);
        s.view.set_editable(false);
        assert!(!check(&mut s, &ShowPredicate::Default, false));
        assert!(check(&mut s, &ShowPredicate::Always, false));
    }

    #[test]
    fn test_custom_predicate_sees_positions() {
        let mut s = setup(&["", ""], 3, true);
        let at_three = ShowPredicate::custom(|props| props.from == 3 && props.to == 3);
        assert!(check(&mut s, &at_three, false));
        let never = ShowPredicate::custom(|_| false);
        assert!(!check(&mut s, &never, false));
        assert_eq!(format!("{never:?}"), "Custom");
    }

    #[test]
    fn test_unconfigured_predicate_always_shows() {
        assert!(matches!(ShowPredicate::default(), ShowPredicate::Always));
        let mut s = setup(&[""], 1, true);
        s.view.blur();
        s.view.set_editable(false);
        assert!(check(&mut s, &ShowPredicate::default(), false));
    }

    #[test]
    fn test_plugin_gate_ignores_focus() {
        let mut s = setup(&[""], 1, true);
        s.view.blur();
        assert!(plugin_gate(s.view.state(), &s.key, false));
    }
}
