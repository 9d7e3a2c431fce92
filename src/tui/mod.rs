//! # TUI Adapter
//!
//! The ratatui-specific layer. Sets up the terminal, drives the
//! [`AppShell`], and feeds it terminal events and background actions.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! The event loop uses conditional redraw to avoid unnecessary work:
//!
//! - **Animating** (toasts counting down): polls every ~80ms.
//! - **Idle**: sleeps up to 500ms and only redraws on events, background
//!   actions, resize, or when storage finishes a sync.

mod component;
pub mod components;
pub mod document;
mod event;
pub mod keyboard;
pub mod markdown;
pub mod shell;
pub mod style;

pub use event::TuiEvent;

use log::info;
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::preferences::PreferencesStore;
use crate::storage::Storage;
use crate::tui::event::{poll_event_immediate, poll_event_timeout};
use crate::tui::shell::{AppShell, ShellOptions};

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Cmd/Super chords through on terminals
        // that support it; others ignore the request.
        execute!(
            stdout(),
            EnableBracketedPaste,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags, DisableBracketedPaste);
    }
}

pub fn run(
    storage: Arc<dyn Storage>,
    preferences: PreferencesStore,
    options: ShellOptions,
) -> std::io::Result<()> {
    let mut shell = AppShell::new(storage, preferences, options);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();
    shell.document_mut().attach();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();
    shell.mount(tx);

    let mut needs_redraw = true; // Force first frame

    let result = loop {
        if shell.sync_key_handler() {
            needs_redraw = true;
        }

        if needs_redraw {
            if let Err(e) = terminal.draw(|f| shell.render(f)) {
                break Err(e);
            }
            needs_redraw = false;
        }

        let timeout = if shell.is_animating() {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);

        // Process first event + drain ALL pending events before next draw
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            shell.handle_event(event);
            if shell.should_quit() {
                break;
            }
            // A toggle inside this batch must rebind before the next key.
            shell.sync_key_handler();
        }
        if shell.should_quit() {
            break Ok(());
        }

        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            shell.apply(action);
        }

        if shell.tick(Instant::now()) {
            needs_redraw = true;
        }
    };

    shell.document_mut().detach();
    ratatui::restore();
    info!("Terminal restored");
    result
}
