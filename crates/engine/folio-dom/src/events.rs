//! Keyboard Events
//!
//! `keydown`-style events dispatched from the focused element up to the
//! document node. Every keyboard event is cancelable.

use std::fmt;

use crate::{Document, NodeId};

/// Logical key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Tab,
    Escape,
    Enter,
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Character(char),
    Other(String),
}

impl Key {
    /// Parse a key name as reported by `KeyboardEvent.key`
    pub fn parse(name: &str) -> Self {
        match name {
            "Tab" | "tab" => Self::Tab,
            "Escape" | "Esc" | "escape" | "esc" => Self::Escape,
            "Enter" | "enter" | "Return" => Self::Enter,
            " " | "Space" | "space" | "Spacebar" => Self::Space,
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "Home" => Self::Home,
            "End" => Self::End,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Character(c),
                    _ => Self::Other(other.to_string()),
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Tab => "Tab",
            Self::Escape => "Escape",
            Self::Enter => "Enter",
            Self::Space => "Space",
            Self::ArrowUp => "ArrowUp",
            Self::ArrowDown => "ArrowDown",
            Self::ArrowLeft => "ArrowLeft",
            Self::ArrowRight => "ArrowRight",
            Self::Home => "Home",
            Self::End => "End",
            Self::Character(_) => "Character",
            Self::Other(name) => name,
        }
    }
}

/// Listener handle returned by `Document::add_key_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Key listener callback
///
/// Listeners receive the document mutably so they can move focus or
/// remove themselves while being dispatched.
pub type KeyListener = Box<dyn FnMut(&mut Document, &mut KeyboardEvent)>;

/// Keyboard event
#[derive(Debug, Clone)]
pub struct KeyboardEvent {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl KeyboardEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
            target: NodeId::NONE,
            current_target: NodeId::NONE,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn tab() -> Self {
        Self::new(Key::Tab)
    }

    pub fn shift_tab() -> Self {
        Self::new(Key::Tab).with_shift()
    }

    pub fn escape() -> Self {
        Self::new(Key::Escape)
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Parse a chord such as `Shift+Tab` or `Ctrl+Alt+k`
    pub fn parse(chord: &str) -> Self {
        let mut parts: Vec<&str> = chord.split('+').map(str::trim).collect();
        // "Ctrl++" names the plus key itself
        let key = match parts.pop() {
            Some("") if chord.ends_with('+') => {
                parts.pop();
                "+"
            }
            Some(key) => key,
            None => "",
        };

        let mut event = Self::new(Key::parse(key));
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "shift" => event.shift = true,
                "ctrl" | "control" => event.ctrl = true,
                "alt" | "option" => event.alt = true,
                "meta" | "cmd" | "super" => event.meta = true,
                _ => {}
            }
        }
        event
    }

    #[inline]
    pub fn is_tab(&self) -> bool {
        self.key == Key::Tab
    }

    #[inline]
    pub fn is_escape(&self) -> bool {
        self.key == Key::Escape
    }

    /// Element the event was dispatched at
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listener is currently running
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

impl fmt::Display for KeyboardEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl { f.write_str("Ctrl+")?; }
        if self.alt { f.write_str("Alt+")?; }
        if self.shift { f.write_str("Shift+")?; }
        if self.meta { f.write_str("Cmd+")?; }
        match &self.key {
            Key::Character(c) => write!(f, "{c}"),
            key => f.write_str(key.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chord() {
        let event = KeyboardEvent::parse("Shift+Tab");
        assert!(event.is_tab());
        assert!(event.shift);
        assert!(!event.ctrl);

        let event = KeyboardEvent::parse("Ctrl+Alt+k");
        assert_eq!(event.key, Key::Character('k'));
        assert!(event.ctrl && event.alt);

        assert!(KeyboardEvent::parse("Esc").is_escape());
        assert_eq!(KeyboardEvent::parse("Ctrl++").key, Key::Character('+'));
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(KeyboardEvent::shift_tab().to_string(), "Shift+Tab");
        assert_eq!(KeyboardEvent::parse("Ctrl+Escape").to_string(), "Ctrl+Escape");
    }

    #[test]
    fn test_prevent_default() {
        let mut event = KeyboardEvent::tab();
        assert!(!event.is_default_prevented());
        event.prevent_default();
        assert!(event.is_default_prevented());
    }
}
