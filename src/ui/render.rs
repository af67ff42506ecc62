//! Render functions for the TUI.
//!
//! This module handles all rendering logic, dispatching to the appropriate
//! view based on application state.

use crate::app::App;
use crate::controller::FeedStatus;
use crate::feed::RemoteApi;
use crate::mode::PresentationMode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{categories, grid, player, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 12;

/// Main render dispatch function.
///
/// Routes to the grid or full-screen view. Handles terminal size validation
/// before rendering.
pub(super) fn render<A: RemoteApi>(f: &mut Frame, app: &mut App<A>) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        // For very small terminals, just show a minimal message
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    categories::render(f, app, chunks[0]);
    render_feed(f, app, chunks[1]);
    status::render(f, app, chunks[2]);
}

/// Render the feed body, or the empty/loading/error state.
fn render_feed<A: RemoteApi>(f: &mut Frame, app: &mut App<A>, area: Rect) {
    if app.feed.items().is_empty() {
        render_empty(f, app.feed.status(), area);
        return;
    }

    match app.feed.mode() {
        PresentationMode::Grid => grid::render(f, app, area),
        PresentationMode::FullScreen => player::render(f, app, area),
    }
}

fn render_empty(f: &mut Frame, status: &FeedStatus, area: Rect) {
    let (text, style) = match status {
        FeedStatus::Idle | FeedStatus::Loading => {
            ("Loading...".to_string(), Style::default().fg(Color::Gray))
        }
        FeedStatus::Ready => (
            "Nothing in this category yet".to_string(),
            Style::default().fg(Color::Gray),
        ),
        FeedStatus::Failed(msg) => (
            format!("Could not load feed\n\n{msg}\n\n[r] to retry"),
            Style::default().fg(Color::Red),
        ),
    };

    let paragraph = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}
