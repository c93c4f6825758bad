//! Event handling.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Result of event handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Continue processing.
    Continue,
    /// Exit application.
    Exit,
}

/// What an operator key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Leave the application.
    Quit,
    /// Charge, or acknowledge a finished attempt.
    Confirm,
    /// Abort the current attempt.
    Cancel,
    /// Go back to ready.
    Retry,
    /// Close a finished attempt.
    Dismiss,
    /// Simulator: the POS pushes a request.
    PushDemoRequest,
    /// Simulator: the POS clears its request.
    ClearRequest,
}

/// Terminal key classifier.
pub struct EventHandler;

impl EventHandler {
    /// Maps a key press to an operator action.
    #[must_use]
    pub fn classify(key: &KeyEvent) -> Option<KeyAction> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if Self::is_quit_event(key) {
            return Some(KeyAction::Quit);
        }
        if Self::is_submit_event(key) {
            return Some(KeyAction::Confirm);
        }
        if Self::is_cancel_event(key) {
            return Some(KeyAction::Cancel);
        }
        if key.modifiers != KeyModifiers::NONE && key.modifiers != KeyModifiers::SHIFT {
            return None;
        }

        match key.code {
            KeyCode::Char('r' | 'R') => Some(KeyAction::Retry),
            KeyCode::Char('d' | 'D') => Some(KeyAction::Dismiss),
            KeyCode::Char('n') => Some(KeyAction::PushDemoRequest),
            KeyCode::Char('x') => Some(KeyAction::ClearRequest),
            _ => None,
        }
    }

    /// Checks if key is a quit event.
    #[must_use]
    pub fn is_quit_event(key: &KeyEvent) -> bool {
        matches!(
            key,
            KeyEvent {
                code: KeyCode::Char('q'),
                modifiers: KeyModifiers::NONE,
                ..
            } | KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
        )
    }

    /// Checks if key is a submit event.
    #[must_use]
    pub fn is_submit_event(key: &KeyEvent) -> bool {
        matches!(
            key,
            KeyEvent {
                code: KeyCode::Enter,
                ..
            }
        )
    }

    /// Checks if key cancels the attempt.
    #[must_use]
    pub fn is_cancel_event(key: &KeyEvent) -> bool {
        matches!(
            key,
            KeyEvent {
                code: KeyCode::Esc,
                ..
            } | KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::NONE,
                ..
            }
        )
    }
}
