//! Line-based hotkey source
//!
//! Reads one hotkey per line (e.g. `ctrl+alt+1`) from a reader, typically
//! standard input. Used on platforms without a global event tap and for
//! driving the dispatcher by hand.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{Hotkey, HotkeyError, HotkeyEvent, HotkeySource};

/// Hotkey source fed by lines of text
pub struct ConsoleSource<R> {
    // Taken by the reader thread so the stream closes when input ends
    parts: Mutex<Option<(R, mpsc::Sender<HotkeyEvent>)>>,
    running: Arc<AtomicBool>,
}

impl<R: BufRead + Send + 'static> ConsoleSource<R> {
    pub fn new(reader: R, event_tx: mpsc::Sender<HotkeyEvent>) -> Self {
        Self {
            parts: Mutex::new(Some((reader, event_tx))),
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<R: BufRead + Send + 'static> HotkeySource for ConsoleSource<R> {
    /// The reader is consumed by the first start; the source cannot restart.
    fn start(&self) -> Result<(), HotkeyError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HotkeyError::AlreadyRunning);
        }

        let parts = self.parts.lock().ok().and_then(|mut guard| guard.take());
        let Some((reader, event_tx)) = parts else {
            self.running.store(false, Ordering::SeqCst);
            return Err(HotkeyError::Exhausted);
        };
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("hotkey-console".to_string())
            .spawn(move || {
                info!("reading hotkeys from console, one per line");
                read_lines(reader, &event_tx, &running);
                running.store(false, Ordering::SeqCst);
                debug!("console hotkey source finished");
            })
            .map_err(|e| HotkeyError::ThreadSpawn(e.to_string()))?;

        Ok(())
    }

    fn stop(&self) {
        // A blocked read only notices this after the next line
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn read_lines<R: BufRead>(reader: R, event_tx: &mpsc::Sender<HotkeyEvent>, running: &AtomicBool) {
    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(?e, "failed to read hotkey line");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match Hotkey::parse(&line) {
            Ok(hotkey) => {
                if event_tx.blocking_send(HotkeyEvent::Pressed(hotkey)).is_err() {
                    break;
                }
            }
            Err(e) => warn!(input = %line.trim(), %e, "ignoring unparsable hotkey"),
        }
    }
}
