//! Hotkey definitions and modifier state tracking
//!
//! A [`Hotkey`] is a set of modifier keys plus exactly one non-modifier key.
//! Hotkeys are parsed from strings such as `ctrl+alt+1` and normalized so
//! that case, aliases and modifier order do not matter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::keycode::is_key_name;

/// Modifier flag masks from macOS CGEventFlags
#[cfg(target_os = "macos")]
pub mod flags {
    use core_graphics::event::CGEventFlags;

    /// Control key modifier flag
    pub const CONTROL: CGEventFlags = CGEventFlags::CGEventFlagControl;
    /// Option/Alt key modifier flag
    pub const OPTION: CGEventFlags = CGEventFlags::CGEventFlagAlternate;
    /// Shift key modifier flag
    pub const SHIFT: CGEventFlags = CGEventFlags::CGEventFlagShift;
    /// Command key modifier flag
    pub const COMMAND: CGEventFlags = CGEventFlags::CGEventFlagCommand;
}

/// Tracks which modifier keys are part of a combination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierState {
    /// Control key is held
    pub control: bool,
    /// Option/Alt key is held
    pub option: bool,
    /// Shift key is held
    pub shift: bool,
    /// Command/Meta key is held
    pub command: bool,
}

impl ModifierState {
    /// Create a new ModifierState from CGEventFlags
    #[cfg(target_os = "macos")]
    pub fn from_flags(event_flags: core_graphics::event::CGEventFlags) -> Self {
        Self {
            control: event_flags.contains(flags::CONTROL),
            option: event_flags.contains(flags::OPTION),
            shift: event_flags.contains(flags::SHIFT),
            command: event_flags.contains(flags::COMMAND),
        }
    }

    /// Check if all modifiers are released
    pub fn is_empty(&self) -> bool {
        !self.control && !self.option && !self.shift && !self.command
    }

    /// Set the modifier named by `token`, returning false if it is not a modifier
    fn set(&mut self, token: &str) -> bool {
        match token {
            "ctrl" | "control" => self.control = true,
            "alt" | "option" | "opt" => self.option = true,
            "shift" => self.shift = true,
            "cmd" | "command" | "meta" | "super" | "win" => self.command = true,
            _ => return false,
        }
        true
    }
}

/// Errors produced while parsing a hotkey string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeyParseError {
    #[error("hotkey is empty")]
    Empty,

    #[error("hotkey '{0}' has no non-modifier key")]
    MissingKey(String),

    #[error("hotkey '{0}' has more than one non-modifier key")]
    MultipleKeys(String),

    #[error("hotkey '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("'{key}' in hotkey '{hotkey}' is not a supported key")]
    UnknownKey { hotkey: String, key: String },
}

/// A normalized key combination, e.g. `ctrl+alt+1`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hotkey {
    modifiers: ModifierState,
    key: String,
}

impl Hotkey {
    /// Build a hotkey from modifiers and a key name
    pub fn new(modifiers: ModifierState, key: &str) -> Self {
        Self {
            modifiers,
            key: canonical_key(&key.to_ascii_lowercase()).to_string(),
        }
    }

    /// Parse a hotkey string such as `Ctrl+Shift+L`
    pub fn parse(input: &str) -> Result<Self, HotkeyParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(HotkeyParseError::Empty);
        }

        let mut modifiers = ModifierState::default();
        let mut key: Option<String> = None;

        for segment in trimmed.split('+') {
            let token = segment.trim().to_ascii_lowercase();
            if token.is_empty() {
                return Err(HotkeyParseError::EmptySegment(trimmed.to_string()));
            }
            if modifiers.set(&token) {
                continue;
            }
            if key.is_some() {
                return Err(HotkeyParseError::MultipleKeys(trimmed.to_string()));
            }
            key = Some(canonical_key(&token).to_string());
        }

        let key = key.ok_or_else(|| HotkeyParseError::MissingKey(trimmed.to_string()))?;
        if !is_key_name(&key) {
            return Err(HotkeyParseError::UnknownKey {
                hotkey: trimmed.to_string(),
                key,
            });
        }
        Ok(Self { modifiers, key })
    }

    /// Modifier keys of this combination
    pub fn modifiers(&self) -> ModifierState {
        self.modifiers
    }

    /// The non-modifier key name
    pub fn key(&self) -> &str {
        &self.key
    }
}

fn canonical_key(token: &str) -> &str {
    match token {
        "esc" => "escape",
        "return" => "enter",
        "spacebar" => "space",
        "del" => "delete",
        "pgup" => "pageup",
        "pgdn" | "pagedn" => "pagedown",
        other => other,
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.control {
            write!(f, "ctrl+")?;
        }
        if self.modifiers.option {
            write!(f, "alt+")?;
        }
        if self.modifiers.shift {
            write!(f, "shift+")?;
        }
        if self.modifiers.command {
            write!(f, "cmd+")?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Hotkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hotkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Hotkey::parse(&raw).map_err(serde::de::Error::custom)
    }
}
