//! Keyboard input and key chords

use std::fmt;
use std::str::FromStr;

use crate::error::{PlatformError, Result};

// ============================================================================
// Keyboard Events
// ============================================================================

/// Keyboard event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyboardEvent {
    /// The key that was pressed or released
    pub key: Key,
    /// Whether the key was pressed or released
    pub state: KeyState,
    /// Modifier keys held during this event
    pub modifiers: Modifiers,
}

impl KeyboardEvent {
    /// A key press with no modifiers held
    pub fn pressed(key: Key) -> Self {
        Self {
            key,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
        }
    }

    /// A key press with the given modifiers held
    pub fn pressed_with(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            state: KeyState::Pressed,
            modifiers,
        }
    }

    /// Check whether this is a press of the escape key
    pub fn is_escape(&self) -> bool {
        self.state == KeyState::Pressed && self.key == Key::Escape
    }
}

/// Key press/release state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// Key was pressed
    Pressed,
    /// Key was released
    Released,
}

/// Modifier key state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Shift key is held
    pub shift: bool,
    /// Control key is held
    pub ctrl: bool,
    /// Alt key is held (Option on macOS)
    pub alt: bool,
    /// Meta key is held (Command on macOS, Windows key on Windows)
    pub meta: bool,
}

impl Modifiers {
    /// Check if no modifiers are held
    pub fn is_empty(&self) -> bool {
        !self.shift && !self.ctrl && !self.alt && !self.meta
    }

    /// Modifier set for the platform's primary shortcut key (`Mod`)
    ///
    /// Command on macOS, Control everywhere else.
    pub fn primary() -> Self {
        if is_mac() {
            Self {
                meta: true,
                ..Self::default()
            }
        } else {
            Self {
                ctrl: true,
                ..Self::default()
            }
        }
    }
}

/// Whether `Mod` resolves to Command
pub fn is_mac() -> bool {
    cfg!(any(target_os = "macos", target_os = "ios"))
}

/// Key codes
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    // Special keys
    Space,
    Enter,
    Escape,
    Backspace,
    Tab,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,

    // Arrow keys
    Left,
    Right,
    Up,
    Down,

    // Modifier keys (for tracking state)
    Shift,
    Ctrl,
    Alt,
    Meta,

    // Character input, letters are stored lowercase
    Char(char),

    // Unknown key
    Unknown,
}

impl Key {
    /// Build a character key, folding ASCII letters to lowercase
    pub fn char(c: char) -> Self {
        Key::Char(c.to_ascii_lowercase())
    }

    /// Canonical keymap name for this key
    pub fn name(&self) -> String {
        match self {
            Key::Space => "Space".into(),
            Key::Enter => "Enter".into(),
            Key::Escape => "Escape".into(),
            Key::Backspace => "Backspace".into(),
            Key::Tab => "Tab".into(),
            Key::Delete => "Delete".into(),
            Key::Home => "Home".into(),
            Key::End => "End".into(),
            Key::PageUp => "PageUp".into(),
            Key::PageDown => "PageDown".into(),
            Key::Left => "ArrowLeft".into(),
            Key::Right => "ArrowRight".into(),
            Key::Up => "ArrowUp".into(),
            Key::Down => "ArrowDown".into(),
            Key::Shift => "Shift".into(),
            Key::Ctrl => "Control".into(),
            Key::Alt => "Alt".into(),
            Key::Meta => "Meta".into(),
            Key::Char(c) => c.to_string(),
            Key::Unknown => "Unidentified".into(),
        }
    }
}

impl FromStr for Key {
    type Err = PlatformError;

    fn from_str(name: &str) -> Result<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Key::char(c));
        }
        let key = match name {
            "Space" => Key::Space,
            "Enter" | "Return" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            "Backspace" => Key::Backspace,
            "Tab" => Key::Tab,
            "Delete" | "Del" => Key::Delete,
            "Home" => Key::Home,
            "End" => Key::End,
            "PageUp" => Key::PageUp,
            "PageDown" => Key::PageDown,
            "ArrowLeft" | "Left" => Key::Left,
            "ArrowRight" | "Right" => Key::Right,
            "ArrowUp" | "Up" => Key::Up,
            "ArrowDown" | "Down" => Key::Down,
            other => return Err(PlatformError::UnknownKey(other.to_string())),
        };
        Ok(key)
    }
}

// ============================================================================
// Key Chords
// ============================================================================

/// A key plus the exact modifier set required to trigger a binding
///
/// Parsed from strings such as `"Mod-/"`, `"Shift-Enter"` or `"Escape"`.
/// Recognised modifier prefixes are `Mod`, `Ctrl`/`Control`/`c`,
/// `Alt`/`a`, `Shift`/`s` and `Meta`/`Cmd`/`m`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyChord {
    /// The non-modifier key
    pub key: Key,
    /// Modifiers that must be held
    pub modifiers: Modifiers,
}

impl KeyChord {
    /// Check whether a keyboard event triggers this chord
    pub fn matches(&self, event: &KeyboardEvent) -> bool {
        event.state == KeyState::Pressed
            && event.key == self.key
            && event.modifiers == self.modifiers
    }
}

impl FromStr for KeyChord {
    type Err = PlatformError;

    fn from_str(chord: &str) -> Result<Self> {
        if chord.is_empty() {
            return Err(PlatformError::EmptyChord(chord.to_string()));
        }

        // A trailing '-' is the minus key itself, not a separator.
        let (prefix, key_name) = match chord.strip_suffix("--") {
            Some(rest) => (Some(rest), "-"),
            None if chord == "-" => (None, "-"),
            None => match chord.rsplit_once('-') {
                Some((rest, key)) if !key.is_empty() => (Some(rest), key),
                Some(_) => return Err(PlatformError::EmptyChord(chord.to_string())),
                None => (None, chord),
            },
        };

        let mut modifiers = Modifiers::default();
        for part in prefix.into_iter().flat_map(|p| p.split('-')) {
            match part {
                "Mod" | "mod" => {
                    let primary = Modifiers::primary();
                    modifiers.meta |= primary.meta;
                    modifiers.ctrl |= primary.ctrl;
                }
                "Ctrl" | "Control" | "c" => modifiers.ctrl = true,
                "Alt" | "a" => modifiers.alt = true,
                "Shift" | "s" => modifiers.shift = true,
                "Meta" | "Cmd" | "m" => modifiers.meta = true,
                other => {
                    return Err(PlatformError::UnknownModifier {
                        modifier: other.to_string(),
                        chord: chord.to_string(),
                    })
                }
            }
        }

        Ok(Self {
            key: key_name.parse()?,
            modifiers,
        })
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            f.write_str("Ctrl-")?;
        }
        if self.modifiers.alt {
            f.write_str("Alt-")?;
        }
        if self.modifiers.shift {
            f.write_str("Shift-")?;
        }
        if self.modifiers.meta {
            f.write_str("Meta-")?;
        }
        f.write_str(&self.key.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_key() {
        let chord: KeyChord = "Escape".parse().unwrap();
        assert_eq!(chord.key, Key::Escape);
        assert!(chord.modifiers.is_empty());
    }

    #[test]
    fn test_parse_mod_slash() {
        let chord: KeyChord = "Mod-/".parse().unwrap();
        assert_eq!(chord.key, Key::Char('/'));
        assert_eq!(chord.modifiers, Modifiers::primary());
    }

    #[test]
    fn test_parse_minus_key() {
        let chord: KeyChord = "Ctrl--".parse().unwrap();
        assert_eq!(chord.key, Key::Char('-'));
        assert!(chord.modifiers.ctrl);

        let bare: KeyChord = "-".parse().unwrap();
        assert_eq!(bare.key, Key::Char('-'));
    }

    #[test]
    fn test_letters_fold_to_lowercase() {
        let chord: KeyChord = "Shift-K".parse().unwrap();
        assert_eq!(chord.key, Key::Char('k'));
        assert!(chord.modifiers.shift);
    }

    #[test]
    fn test_unknown_modifier_is_rejected() {
        let err = "Hyper-k".parse::<KeyChord>().unwrap_err();
        assert!(matches!(err, PlatformError::UnknownModifier { .. }));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = "Ctrl-Launchpad".parse::<KeyChord>().unwrap_err();
        assert_eq!(err, PlatformError::UnknownKey("Launchpad".into()));
    }

    #[test]
    fn test_empty_chord_is_rejected() {
        let err = "".parse::<KeyChord>().unwrap_err();
        assert_eq!(err, PlatformError::EmptyChord(String::new()));
        let err = "Shift-".parse::<KeyChord>().unwrap_err();
        assert_eq!(err.to_string(), "Empty key chord: \"Shift-\"");
    }

    #[test]
    fn test_chord_matches_exact_modifiers() {
        let chord: KeyChord = "Escape".parse().unwrap();
        assert!(chord.matches(&KeyboardEvent::pressed(Key::Escape)));

        let shifted = KeyboardEvent::pressed_with(
            Key::Escape,
            Modifiers {
                shift: true,
                ..Modifiers::default()
            },
        );
        assert!(!chord.matches(&shifted));

        let released = KeyboardEvent {
            state: KeyState::Released,
            ..KeyboardEvent::pressed(Key::Escape)
        };
        assert!(!chord.matches(&released));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let chord: KeyChord = "Ctrl-Shift-ArrowUp".parse().unwrap();
        let again: KeyChord = chord.to_string().parse().unwrap();
        assert_eq!(chord, again);
    }
}
