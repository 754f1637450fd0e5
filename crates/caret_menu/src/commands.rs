//! Visibility toggle commands and their key bindings

use caret_core::{command, Command, Keymap, PluginKey};

use crate::caret::is_in_empty_textblock;
use crate::error::Result;

/// Default chord that opens the menu
pub const DEFAULT_OPEN_KEY: &str = "Mod-/";

/// Default chord that closes the menu
pub const DEFAULT_CLOSE_KEY: &str = "Escape";

/// Tag a transaction with the requested visibility
///
/// The transaction changes nothing else. Always applies, so a dry run
/// returns `true` too.
pub fn set_float_menu(key: &PluginKey, visible: bool) -> Command {
    let key = key.clone();
    command(move |state, dispatch| {
        if let Some(dispatch) = dispatch {
            let mut tr = state.tr();
            tr.set_meta(&key, visible);
            dispatch(tr);
        }
        true
    })
}

/// Open the menu when the selection end sits in an empty textblock
pub fn open_float_menu(key: &PluginKey) -> Command {
    let show = set_float_menu(key, true);
    command(move |state, dispatch| {
        let eligible = state
            .selection()
            .resolve_to(state.doc())
            .map(|pos| is_in_empty_textblock(&pos))
            .unwrap_or(false);
        eligible && show(state, dispatch)
    })
}

/// Close the menu unconditionally
pub fn close_float_menu(key: &PluginKey) -> Command {
    set_float_menu(key, false)
}

/// The open and close bindings
pub fn floating_menu_keymap(key: &PluginKey, open_key: &str, close_key: &str) -> Result<Keymap> {
    let keymap = Keymap::new()
        .bind(open_key, open_float_menu(key))?
        .bind(close_key, close_float_menu(key))?;
    Ok(keymap)
}

#[cfg(test)]
mod tests {
    use caret_core::{EditorState, Plugin, Schema, Selection, Transaction};
    use caret_platform::{Key, KeyboardEvent, Modifiers};

    use super::*;
    use crate::error::MenuError;
    use crate::visibility::{show_floating_menu, VisibilityState};

    fn state_with(key: &PluginKey, text: &str) -> EditorState {
        let schema = Schema::basic();
        let mut state = EditorState::builder(schema)
            .plugin(Plugin::new(key.clone()).with_state(VisibilityState::new(key.clone())))
            .build()
            .unwrap();
        if !text.is_empty() {
            let mut tr = state.tr();
            tr.insert_text(1, text).unwrap();
            state = state.apply(&tr).unwrap();
        }
        state
    }

    fn run(cmd: &Command, state: &EditorState) -> Option<EditorState> {
        let mut out = None;
        let applied = cmd(state, Some(&mut |tr: Transaction| out = Some(state.apply(&tr).unwrap())));
        assert_eq!(applied, out.is_some());
        out
    }

    #[test]
    fn test_set_float_menu_dry_run() {
        let key = PluginKey::new("floatingMenu");
        let state = state_with(&key, "");
        assert!(set_float_menu(&key, true)(&state, None));
        assert!(set_float_menu(&key, false)(&state, None));
    }

    #[test]
    fn test_set_float_menu_only_tags() {
        let key = PluginKey::new("floatingMenu");
        let state = state_with(&key, "");
        let next = run(&set_float_menu(&key, true), &state).unwrap();
        assert!(show_floating_menu(&next, &key));
        assert_eq!(next.doc(), state.doc());
        assert_eq!(next.selection(), state.selection());
    }

    #[test]
    fn test_open_requires_empty_block() {
        let key = PluginKey::new("floatingMenu");
        let empty = state_with(&key, "");
        assert!(open_float_menu(&key)(&empty, None));

        let filled = state_with(&key, "hi");
        assert!(!open_float_menu(&key)(&filled, None));
        assert!(run(&open_float_menu(&key), &filled).is_none());
    }

    #[test]
    fn test_open_checks_selection_end() {
        let key = PluginKey::new("floatingMenu");
        let schema = Schema::basic();
        let doc = schema
            .node(
                "doc",
                Default::default(),
                vec![
                    schema
                        .node("paragraph", Default::default(), vec![schema.text("ab")])
                        .unwrap(),
                    schema.node("paragraph", Default::default(), vec![]).unwrap(),
                ],
            )
            .unwrap();
        let state = EditorState::builder(schema)
            .doc(doc)
            .selection(Selection::range(1, 5))
            .plugin(Plugin::new(key.clone()).with_state(VisibilityState::new(key.clone())))
            .build()
            .unwrap();
        assert!(open_float_menu(&key)(&state, None));
    }

    #[test]
    fn test_keymap_bindings() {
        let key = PluginKey::new("floatingMenu");
        let keymap = floating_menu_keymap(&key, DEFAULT_OPEN_KEY, DEFAULT_CLOSE_KEY).unwrap();
        assert_eq!(keymap.len(), 2);

        let state = state_with(&key, "");
        let open = KeyboardEvent::pressed_with(Key::char('/'), Modifiers::primary());
        let mut opened = None;
        assert!(keymap.handle(&state, &open, Some(&mut |tr: Transaction| {
            opened = Some(state.apply(&tr).unwrap())
        })));
        let opened = opened.unwrap();
        assert!(show_floating_menu(&opened, &key));

        // close always consumes, even outside an empty block
        let filled = state_with(&key, "hi");
        assert!(keymap.handle(&filled, &KeyboardEvent::pressed(Key::Escape), None));
        assert!(!keymap.handle(&filled, &open, None));
    }

    #[test]
    fn test_invalid_open_key() {
        let key = PluginKey::new("floatingMenu");
        let err = floating_menu_keymap(&key, "Hyper-/", DEFAULT_CLOSE_KEY).unwrap_err();
        assert!(matches!(err, MenuError::InvalidKeyBinding(_)));
    }
}
