//! Key bindings (normal and vim-style) and mouse-to-pointer mapping.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Pause,
    Restart,
    Quit,
    PowerExtra,
    PowerShrink,
    PowerExpand,
    None,
}

/// Map key event to an action. Arrows/Enter and vim hjkl both work; power-up
/// hotkeys are the number row.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod && modifiers != KeyModifiers::CONTROL {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc if no_mod => Action::Quit,
        KeyCode::Char('p') if no_mod => Action::Pause,
        KeyCode::Char('r') | KeyCode::Char('R') if no_mod => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') if no_mod => Action::Left,
        KeyCode::Right | KeyCode::Char('l') if no_mod => Action::Right,
        KeyCode::Up | KeyCode::Char('k') if no_mod => Action::Up,
        KeyCode::Down | KeyCode::Char('j') if no_mod => Action::Down,
        KeyCode::Enter | KeyCode::Char(' ') if no_mod => Action::Confirm,
        KeyCode::Char('1') if no_mod => Action::PowerExtra,
        KeyCode::Char('2') if no_mod => Action::PowerShrink,
        KeyCode::Char('3') if no_mod => Action::PowerExpand,
        _ => Action::None,
    }
}

/// Pointer sample from the terminal mouse, in screen cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    Down { x: u16, y: u16 },
    Drag { x: u16, y: u16 },
    Up,
}

/// Left-button presses, drags and releases become pointer samples;
/// everything else (scroll, right button, hover) is discarded.
pub fn mouse_to_pointer(ev: MouseEvent) -> Option<Pointer> {
    match ev.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Pointer::Down {
            x: ev.column,
            y: ev.row,
        }),
        MouseEventKind::Drag(MouseButton::Left) => Some(Pointer::Drag {
            x: ev.column,
            y: ev.row,
        }),
        MouseEventKind::Up(MouseButton::Left) => Some(Pointer::Up),
        _ => None,
    }
}
