//! Event handling for the TUI event loop.
//!
//! Wraps crossterm key, paste, mouse and resize events into a single
//! [`AppEvent`] enum that the main loop can `match` on.

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use std::time::Duration;

// ---------------------------------------------------------------------------
// AppEvent
// ---------------------------------------------------------------------------

/// Events consumed by the TUI event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A key was pressed.
    Key(KeyEvent),
    /// Text was pasted (bracketed paste).
    Paste(String),
    /// Mouse wheel or click.
    Mouse(MouseEvent),
    /// The terminal was resized.
    Resize(u16, u16),
}

// ---------------------------------------------------------------------------
// Event polling
// ---------------------------------------------------------------------------

/// Translate a crossterm event into an [`AppEvent`].
///
/// Key releases and repeats reported by some terminals are dropped so that
/// each physical key press is handled once.
pub fn from_crossterm(event: CrosstermEvent) -> Option<AppEvent> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        CrosstermEvent::Paste(text) => Some(AppEvent::Paste(text)),
        CrosstermEvent::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        CrosstermEvent::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

/// Poll for the next crossterm event with the given timeout.
///
/// Returns `Some(AppEvent)` if an event was available, `None` on timeout.
/// This is a blocking call intended to be run from the main thread.
pub fn poll_crossterm_event(timeout: Duration) -> Option<AppEvent> {
    if event::poll(timeout).ok()? {
        from_crossterm(event::read().ok()?)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
