//! Caret-context predicate
//!
//! The menu is only offered when the caret sits in a block that is truly
//! empty: a plain textblock with no children and nothing a serializer would
//! render. The open shortcut and the plugin-level gate both ask through
//! [`is_in_empty_textblock`].

use caret_core::{get_text, ResolvedPos};

/// Whether the position's parent is an empty, non-code textblock
pub fn is_in_empty_textblock(pos: &ResolvedPos) -> bool {
    let parent = pos.parent();
    let node_type = parent.node_type();

    node_type.is_textblock()
        && !node_type.is_code()
        && parent.text_content().is_empty()
        && parent.child_count() == 0
        && get_text(parent).is_empty()
}
