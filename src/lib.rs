//! hue-hotkeys: global keyboard shortcuts for Philips Hue devices
//!
//! - Hotkey sources (macOS event tap, console lines)
//! - Dispatcher mapping hotkeys to on/off toggles
//! - Hue Bridge REST client
//! - Settings persistence and interactive setup

pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod hotkey;
pub mod lifecycle;
pub mod setup;
