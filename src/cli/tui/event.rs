//! Crossterm event handling for the TUI

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use std::time::Duration;

use super::app::{App, Screen};

/// Mouse scroll lines per event.
const MOUSE_SCROLL_LINES: u32 = 3;

/// Poll crossterm events and update app state.
pub fn handle_events(app: &mut App, timeout: Duration) -> Result<()> {
    // Drain any pending dispatch results first.
    app.poll_responses();

    if event::poll(timeout)? {
        match event::read()? {
            Event::Key(key) => match app.screen {
                Screen::Select => handle_select_key(app, key),
                Screen::Session => handle_session_key(app, key),
            },
            Event::Mouse(mouse) => handle_mouse(app, mouse),
            _ => {}
        }
    }

    // Advance the spinner.
    app.tick();

    Ok(())
}

fn handle_select_key(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c'))
        | (_, KeyCode::Esc)
        | (_, KeyCode::Char('q')) => {
            app.should_quit = true;
        }
        (_, KeyCode::Up) | (_, KeyCode::Char('k')) => app.select_prev(),
        (_, KeyCode::Down) | (_, KeyCode::Char('j')) => app.select_next(),
        (_, KeyCode::Enter) => app.open_cursor_selection(),
        _ => {}
    }
}

fn handle_session_key(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        // ── Quit / back ─────────────────────────────────────────
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            app.should_quit = true;
        }
        (_, KeyCode::Esc) => {
            app.leave_session();
        }

        // ── Scroll / History (Up/Down depend on input state) ───
        (_, KeyCode::Up) if app.is_input_empty() => {
            if app.has_history() {
                app.history_up();
            } else {
                app.scroll_up();
            }
        }
        (_, KeyCode::Down) if app.is_input_empty() => {
            app.scroll_down();
        }
        (_, KeyCode::Up) => app.history_up(),
        (_, KeyCode::Down) => app.history_down(),
        (_, KeyCode::PageUp) => {
            for _ in 0..10 {
                app.scroll_up();
            }
        }
        (_, KeyCode::PageDown) => {
            for _ in 0..10 {
                app.scroll_down();
            }
        }

        // ── Submit (blocked during a pending dispatch) ─────────
        (_, KeyCode::Enter) => {
            if !app.is_loading {
                app.submit();
            }
        }

        // ── Delegate everything else to textarea ───────────────
        _ => {
            app.textarea.input(Event::Key(key));
        }
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            for _ in 0..MOUSE_SCROLL_LINES {
                app.scroll_up();
            }
        }
        MouseEventKind::ScrollDown => {
            for _ in 0..MOUSE_SCROLL_LINES {
                app.scroll_down();
            }
        }
        _ => {}
    }
}
