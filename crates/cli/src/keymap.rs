//! Keyboard source: raw key presses to orchestrator requests.
//!
//! Bindings:
//! - `Enter` runs the script
//! - `Down` / `j` shows the next newer run
//! - `Up` / `k` shows the next older run
//! - `Ctrl-C` / `q` quits
//!
//! Anything else is ignored.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use watchout_core::error::Result;
use watchout_core::request::{Request, RequestSource};

/// Maps one key press to a request.
pub fn request_for_key(key: &KeyEvent) -> Option<Request> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Request::Quit),
        KeyCode::Char('q') => Some(Request::Quit),
        KeyCode::Enter => Some(Request::Run),
        KeyCode::Down | KeyCode::Char('j') => Some(Request::NavigateDown),
        KeyCode::Up | KeyCode::Char('k') => Some(Request::NavigateUp),
        _ => None,
    }
}

/// Maps a terminal event to a request; only key events count.
pub fn request_for_event(event: &Event) -> Option<Request> {
    match event {
        Event::Key(key) => request_for_key(key),
        _ => None,
    }
}

/// Reads key presses from the operator's terminal.
///
/// Expects the terminal to be in raw mode so keys arrive one at a time.
pub struct KeyboardSource;

impl RequestSource for KeyboardSource {
    fn poll_request(&mut self, timeout: Duration) -> Result<Option<Request>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }

        Ok(request_for_event(&event::read()?))
    }

    fn discard_pending(&mut self) -> Result<usize> {
        let mut dropped = 0;
        while event::poll(Duration::ZERO)? {
            event::read()?;
            dropped += 1;
        }
        Ok(dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_enter_runs() {
        assert_eq!(request_for_key(&press(KeyCode::Enter)), Some(Request::Run));
    }

    #[test]
    fn test_vim_keys_match_arrows() {
        assert_eq!(
            request_for_key(&press(KeyCode::Char('j'))),
            request_for_key(&press(KeyCode::Down))
        );
        assert_eq!(
            request_for_key(&press(KeyCode::Char('k'))),
            request_for_key(&press(KeyCode::Up))
        );
    }

    #[test]
    fn test_ctrl_c_quits_but_plain_c_does_not() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(request_for_key(&ctrl_c), Some(Request::Quit));
        assert_eq!(request_for_key(&press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn test_releases_are_ignored() {
        let mut release = press(KeyCode::Enter);
        release.kind = KeyEventKind::Release;
        assert_eq!(request_for_key(&release), None);
    }

    #[test]
    fn test_non_key_events_are_ignored() {
        assert_eq!(request_for_event(&Event::Resize(80, 24)), None);
        assert_eq!(request_for_event(&Event::FocusGained), None);
    }
}
