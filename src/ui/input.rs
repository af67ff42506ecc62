//! Input handling for the TUI.
//!
//! Keys are dispatched according to the current presentation mode.

use crate::app::App;
use crate::feed::RemoteApi;
use crate::mode::PresentationMode;
use crossterm::event::{KeyCode, KeyModifiers};

use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input<A: RemoteApi>(
    app: &mut App<A>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Action {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Action::Quit;
    }

    // Keys shared by both modes
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('f') => {
            app.toggle_focus();
            return Action::Continue;
        }
        KeyCode::Char('o') => {
            app.open_document();
            return Action::Continue;
        }
        _ => {}
    }

    match app.feed.mode() {
        PresentationMode::Grid => handle_grid_input(app, code),
        PresentationMode::FullScreen => handle_full_screen_input(app, code),
    }
    Action::Continue
}

/// Handle input in grid mode.
fn handle_grid_input<A: RemoteApi>(app: &mut App<A>, code: KeyCode) {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Right => app.nav_right(),
        KeyCode::Left => app.nav_left(),
        KeyCode::Char('l') | KeyCode::Tab => app.next_category(),
        KeyCode::Char('h') | KeyCode::BackTab => app.prev_category(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Enter => app.enter(),
        _ => {}
    }
}

/// Handle input in full-screen mode.
fn handle_full_screen_input<A: RemoteApi>(app: &mut App<A>, code: KeyCode) {
    match code {
        KeyCode::Char('j') | KeyCode::Down | KeyCode::PageDown => app.page_down(),
        KeyCode::Char('k') | KeyCode::Up | KeyCode::PageUp => app.page_up(),
        KeyCode::Char('m') | KeyCode::Char(' ') => app.toggle_mute(),
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => app.back(),
        // Category change leaves full-screen
        KeyCode::Char('l') | KeyCode::Tab => app.next_category(),
        KeyCode::Char('h') | KeyCode::BackTab => app.prev_category(),
        _ => {}
    }
}
