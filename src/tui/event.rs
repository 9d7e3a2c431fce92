use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use log::{debug, warn};

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    /// A key-down, including auto-repeats of a held key. Releases are
    /// filtered out.
    Key(KeyEvent),
    /// Bracketed paste. Terminals deliver dragged-in files this way.
    Drop(String),
    Resize,
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(Duration::ZERO)
}

/// Poll for an event, blocking up to `timeout` for the first one.
///
/// Raw events the shell ignores (key releases, focus, mouse) are skipped
/// without waiting again, so `None` means the queue is empty.
pub fn poll_event_timeout(timeout: Duration) -> Option<TuiEvent> {
    let mut wait = timeout;
    loop {
        match event::poll(wait) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                warn!("Event poll failed: {}", e);
                return None;
            }
        }

        let raw = match event::read() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Event read failed: {}", e);
                return None;
            }
        };

        if let Some(event) = map_event(raw) {
            return Some(event);
        }
        wait = Duration::ZERO;
    }
}

fn map_event(raw: Event) -> Option<TuiEvent> {
    match raw {
        Event::Key(key) if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) => {
            debug!("Key event: {:?} with modifiers {:?}", key.code, key.modifiers);
            Some(TuiEvent::Key(key))
        }
        Event::Paste(data) => Some(TuiEvent::Drop(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}
