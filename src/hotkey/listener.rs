//! Global hotkey listener using macOS CGEventTap
//!
//! Monitors system-wide key-down events and forwards presses of watched
//! hotkeys. Runs on a dedicated thread with its own CFRunLoop.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventType, EventField,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::keycode::key_name;
use super::keys::ModifierState;
use super::{Hotkey, HotkeyError, HotkeyEvent, HotkeySource};

/// Raw observations handed from the tap callback to the run loop thread
enum TapEvent {
    KeyDown { keycode: u16, flags: CGEventFlags },
    Disabled,
}

/// Global hotkey listener backed by a listen-only CGEventTap
pub struct HotkeyListener {
    event_tx: mpsc::Sender<HotkeyEvent>,
    watched: Arc<HashSet<Hotkey>>,
    running: Arc<AtomicBool>,
}

impl HotkeyListener {
    /// Create a listener that forwards presses of `watched` hotkeys
    pub fn new(event_tx: mpsc::Sender<HotkeyEvent>, watched: HashSet<Hotkey>) -> Self {
        Self {
            event_tx,
            watched: Arc::new(watched),
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl HotkeySource for HotkeyListener {
    /// Spawns a dedicated thread that runs a CFRunLoop to receive
    /// CGEventTap callbacks until `stop()` is called.
    fn start(&self) -> Result<(), HotkeyError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HotkeyError::AlreadyRunning);
        }

        let event_tx = self.event_tx.clone();
        let watched = Arc::clone(&self.watched);
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || {
                info!("hotkey listener thread started");

                if let Err(e) = run_event_loop(event_tx, &watched, running.clone()) {
                    error!(?e, "hotkey listener error");
                }

                running.store(false, Ordering::SeqCst);
                info!("hotkey listener thread stopped");
            })
            .map_err(|e| HotkeyError::ThreadSpawn(e.to_string()))?;

        Ok(())
    }

    fn stop(&self) {
        // The run loop checks this flag every 100ms
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Run the CFRunLoop with the event tap
fn run_event_loop(
    event_tx: mpsc::Sender<HotkeyEvent>,
    watched: &HashSet<Hotkey>,
    running: Arc<AtomicBool>,
) -> Result<(), HotkeyError> {
    let (callback_tx, callback_rx) = std::sync::mpsc::channel::<TapEvent>();

    // CGEventTap callback - must be fast and non-blocking
    let callback = move |_proxy: core_graphics::event::CGEventTapProxy,
                         event_type: CGEventType,
                         event: &CGEvent|
                         -> Option<CGEvent> {
        match event_type {
            CGEventType::KeyDown => {
                // Holding a hotkey must not toggle repeatedly
                if event.get_integer_value_field(EventField::KEYBOARD_EVENT_AUTOREPEAT) == 0 {
                    let keycode =
                        event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
                    let _ = callback_tx.send(TapEvent::KeyDown {
                        keycode,
                        flags: event.get_flags(),
                    });
                }
            }
            CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                let _ = callback_tx.send(TapEvent::Disabled);
            }
            _ => {}
        }
        Some(event.clone())
    };

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::KeyDown],
        callback,
    )
    .map_err(|_| {
        error!("failed to create event tap - is Accessibility permission granted?");
        HotkeyError::EventTapCreation
    })?;

    tap.enable();

    let run_loop_source = tap
        .mach_port
        .create_runloop_source(0)
        .map_err(|_| HotkeyError::EventTapCreation)?;
    let run_loop = CFRunLoop::get_current();

    unsafe {
        run_loop.add_source(&run_loop_source, kCFRunLoopCommonModes);
    }

    info!(watched = watched.len(), "event tap created and enabled");

    while running.load(Ordering::SeqCst) {
        unsafe {
            CFRunLoop::run_in_mode(
                kCFRunLoopDefaultMode,
                std::time::Duration::from_millis(100),
                true,
            );
        }

        while let Ok(tap_event) = callback_rx.try_recv() {
            let (keycode, flags) = match tap_event {
                TapEvent::KeyDown { keycode, flags } => (keycode, flags),
                TapEvent::Disabled => {
                    warn!("event tap disabled by the system, re-enabling");
                    tap.enable();
                    if event_tx.blocking_send(HotkeyEvent::TapDisabled).is_err() {
                        return Ok(());
                    }
                    continue;
                }
            };

            let Some(name) = key_name(keycode) else {
                continue;
            };
            let hotkey = Hotkey::new(ModifierState::from_flags(flags), name);
            if !watched.contains(&hotkey) {
                continue;
            }

            debug!(%hotkey, "hotkey pressed");
            if event_tx.blocking_send(HotkeyEvent::Pressed(hotkey)).is_err() {
                warn!("failed to send hotkey event - channel closed?");
                return Ok(());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let listener = HotkeyListener::new(tx, HashSet::new());
        assert!(!listener.is_running());
    }
}
