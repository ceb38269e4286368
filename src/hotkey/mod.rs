//! Hotkey module for global keyboard event listening
//!
//! A hotkey source turns key presses into a sequential stream of
//! [`HotkeyEvent`]s delivered over an mpsc channel. On macOS the source is a
//! CGEventTap listener; the console source reads hotkeys typed on stdin.

mod console;
mod keycode;
mod keys;
#[cfg(target_os = "macos")]
mod listener;

pub use console::ConsoleSource;
pub use keys::{Hotkey, HotkeyParseError, ModifierState};
#[cfg(target_os = "macos")]
pub use listener::HotkeyListener;

/// Events sent from a hotkey source to the dispatcher
#[derive(Debug, Clone)]
pub enum HotkeyEvent {
    /// A watched key combination was pressed
    Pressed(Hotkey),
    /// Event tap was disabled by the OS and has been re-enabled
    TapDisabled,
}

/// Errors that can occur when starting a hotkey source
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("hotkey source is already running")]
    AlreadyRunning,

    #[error("hotkey source cannot be restarted")]
    Exhausted,

    #[error("failed to create event tap - check Accessibility permissions")]
    EventTapCreation,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),
}

/// A producer of hotkey presses running on its own thread
pub trait HotkeySource {
    /// Start producing events
    fn start(&self) -> Result<(), HotkeyError>;

    /// Ask the source to stop producing events
    fn stop(&self);

    /// Check if the source is currently running
    fn is_running(&self) -> bool;
}
