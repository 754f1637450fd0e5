//! Menu visibility state machine
//!
//! The controller never flips booleans directly. Showing and hiding go
//! through [`MenuState`] transitions, and the overlay's own lifecycle
//! callbacks (`shown`, `hidden`) complete them. A request that has no
//! transition from the current state is dropped, which is what keeps the
//! controller from double-showing or double-hiding.

use std::hash::Hash;

/// Event-driven state transitions
pub trait StateTransitions:
    Clone + Copy + PartialEq + Eq + Hash + Send + Sync + std::fmt::Debug + 'static
{
    /// Handle an event and return the new state, or None if no transition
    fn on_event(&self, event: u32) -> Option<Self>;
}

/// Event types for the menu state machine
pub mod menu_events {
    /// Show requested (Hidden/PendingHide -> PendingShow)
    pub const SHOW: u32 = 31001;
    /// Overlay reported it is shown (-> Visible)
    pub const SHOWN: u32 = 31002;
    /// Hide requested (PendingShow/Visible -> PendingHide)
    pub const HIDE: u32 = 31003;
    /// Overlay reported it is hidden (-> Hidden)
    pub const HIDDEN: u32 = 31004;
}

/// Overlay visibility as the controller sees it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MenuState {
    /// Not shown
    #[default]
    Hidden,
    /// `show` was called, the overlay has not confirmed yet
    PendingShow,
    /// The overlay reported itself shown
    Visible,
    /// `hide` was called, the overlay has not confirmed yet
    PendingHide,
}

impl MenuState {
    /// Confirmed visible
    pub fn is_visible(&self) -> bool {
        matches!(self, MenuState::Visible)
    }

    /// Visible or on its way there
    pub fn is_showing(&self) -> bool {
        matches!(self, MenuState::PendingShow | MenuState::Visible)
    }
}

impl StateTransitions for MenuState {
    fn on_event(&self, event: u32) -> Option<Self> {
        use menu_events::*;
        use MenuState::*;

        match (self, event) {
            // Requests
            (Hidden, SHOW) | (PendingHide, SHOW) => Some(PendingShow),
            (PendingShow, HIDE) | (Visible, HIDE) => Some(PendingHide),

            // Overlay callbacks are authoritative
            (Hidden, SHOWN) | (PendingShow, SHOWN) | (PendingHide, SHOWN) => Some(Visible),
            (PendingShow, HIDDEN) | (Visible, HIDDEN) | (PendingHide, HIDDEN) => Some(Hidden),

            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::menu_events::*;
    use super::*;

    fn run(start: MenuState, events: &[u32]) -> MenuState {
        events
            .iter()
            .fold(start, |state, event| state.on_event(*event).unwrap_or(state))
    }

    #[test]
    fn test_show_cycle() {
        assert_eq!(run(MenuState::Hidden, &[SHOW]), MenuState::PendingShow);
        assert_eq!(run(MenuState::Hidden, &[SHOW, SHOWN]), MenuState::Visible);
        assert_eq!(
            run(MenuState::Hidden, &[SHOW, SHOWN, HIDE, HIDDEN]),
            MenuState::Hidden
        );
    }

    #[test]
    fn test_repeated_requests_have_no_transition() {
        assert_eq!(MenuState::Visible.on_event(SHOW), None);
        assert_eq!(MenuState::PendingShow.on_event(SHOW), None);
        assert_eq!(MenuState::Hidden.on_event(HIDE), None);
        assert_eq!(MenuState::PendingHide.on_event(HIDE), None);
    }

    #[test]
    fn test_interrupted_transitions() {
        assert_eq!(run(MenuState::Hidden, &[SHOW, HIDE]), MenuState::PendingHide);
        assert_eq!(run(MenuState::Visible, &[HIDE, SHOW]), MenuState::PendingShow);
    }

    #[test]
    fn test_overlay_callbacks_override() {
        assert_eq!(MenuState::Hidden.on_event(SHOWN), Some(MenuState::Visible));
        assert_eq!(MenuState::Visible.on_event(HIDDEN), Some(MenuState::Hidden));
        assert_eq!(MenuState::Hidden.on_event(HIDDEN), None);
    }

    #[test]
    fn test_predicates() {
        assert!(MenuState::PendingShow.is_showing());
        assert!(!MenuState::PendingShow.is_visible());
        assert!(!MenuState::PendingHide.is_showing());
        assert!(!MenuState::Hidden.is_showing());
    }
}
