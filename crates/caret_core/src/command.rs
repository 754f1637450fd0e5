//! Commands and keymaps
//!
//! A [`Command`] inspects a state and, when it applies, builds a transaction
//! and hands it to the optional dispatch callback. Calling a command with no
//! dispatch is a dry run that only answers "would this apply?".

use std::fmt;
use std::sync::Arc;

use caret_platform::{KeyChord, KeyboardEvent};

use crate::error::Result;
use crate::state::EditorState;
use crate::transaction::Transaction;

/// An editor command
pub type Command =
    Arc<dyn Fn(&EditorState, Option<&mut dyn FnMut(Transaction)>) -> bool + Send + Sync>;

/// Wrap a closure as a [`Command`]
pub fn command<F>(f: F) -> Command
where
    F: Fn(&EditorState, Option<&mut dyn FnMut(Transaction)>) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Reborrow an optional dispatch callback for one more call
pub fn reborrow<'a>(
    dispatch: &'a mut Option<&mut dyn FnMut(Transaction)>,
) -> Option<&'a mut dyn FnMut(Transaction)> {
    match dispatch {
        Some(dispatch) => Some(&mut **dispatch),
        None => None,
    }
}

/// Try each command in order until one applies
pub fn chain_commands(commands: Vec<Command>) -> Command {
    command(move |state, mut dispatch| {
        commands
            .iter()
            .any(|command| command(state, reborrow(&mut dispatch)))
    })
}

/// Key chords bound to commands
///
/// Several commands may share a chord; they run in binding order until one
/// returns `true`.
#[derive(Clone, Default)]
pub struct Keymap {
    bindings: Vec<(KeyChord, Command)>,
}

impl Keymap {
    /// Empty keymap
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a chord string such as `"Mod-/"` to a command
    pub fn bind(mut self, chord: &str, command: Command) -> Result<Self> {
        let chord: KeyChord = chord.parse()?;
        self.bindings.push((chord, command));
        Ok(self)
    }

    /// Bind an already parsed chord
    pub fn bind_chord(mut self, chord: KeyChord, command: Command) -> Self {
        self.bindings.push((chord, command));
        self
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound chords, in binding order
    pub fn chords(&self) -> impl Iterator<Item = &KeyChord> {
        self.bindings.iter().map(|(chord, _)| chord)
    }

    /// Run the commands bound to the pressed chord
    pub fn handle(
        &self,
        state: &EditorState,
        event: &KeyboardEvent,
        mut dispatch: Option<&mut dyn FnMut(Transaction)>,
    ) -> bool {
        for (chord, command) in &self.bindings {
            if chord.matches(event) && command(state, reborrow(&mut dispatch)) {
                tracing::debug!(chord = %chord, "key binding handled");
                return true;
            }
        }
        false
    }
}

impl fmt::Debug for Keymap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.bindings.iter().map(|(chord, _)| chord.to_string()))
            .finish()
    }
}
