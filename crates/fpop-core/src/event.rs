#![forbid(unsafe_code)]

//! Input events the host forwards to the engine.
//!
//! The engine never listens to anything itself. Hosts translate their
//! native events (DOM `keydown`, `click`, `input`, `visibilitychange`) into
//! [`PopupEvent`] values and hand them to `Popup::dispatch`.
//!
//! # Design Notes
//!
//! - Key events only distinguish what the popup reacts to; everything else
//!   arrives as `KeyCode::Char` or is simply ignored.
//! - Release events are ignored by the engine, matching `keydown` semantics.

use bitflags::bitflags;
use fpop_dom::NodeId;

/// Canonical popup input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupEvent {
    /// A keyboard event while the popup is shown.
    Key(KeyEvent),
    /// A click on a node (the container itself counts as the backdrop).
    Click(NodeId),
    /// The value of a form control changed.
    Input(NodeId),
    /// The page became visible (`true`) or hidden (`false`).
    Visibility(bool),
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// Press, repeat or release.
    pub kind: KeyEventKind,

    /// Element that had focus when the key went down, if the host knows.
    pub target: Option<NodeId>,
}

impl KeyEvent {
    /// A key press with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
            target: None,
        }
    }

    /// Set the modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the event kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the target element.
    #[must_use]
    pub const fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    /// Whether Shift is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Whether this is a backward tab (`BackTab` or `Shift+Tab`).
    #[must_use]
    pub const fn is_back_tab(&self) -> bool {
        matches!(self.code, KeyCode::BackTab)
            || (matches!(self.code, KeyCode::Tab) && self.shift())
    }
}

/// Key codes the popup distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    Enter,
    Escape,
    Tab,
    /// Shift+Tab as reported by some hosts.
    BackTab,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_tab_is_back_tab() {
        let ev = KeyEvent::new(KeyCode::Tab).with_modifiers(Modifiers::SHIFT);
        assert!(ev.is_back_tab());
        assert!(KeyEvent::new(KeyCode::BackTab).is_back_tab());
        assert!(!KeyEvent::new(KeyCode::Tab).is_back_tab());
    }

    #[test]
    fn default_kind_is_press() {
        assert_eq!(KeyEvent::new(KeyCode::Enter).kind, KeyEventKind::Press);
        assert_eq!(Modifiers::default(), Modifiers::NONE);
    }
}
