use crate::app::App;
use crate::feed::RemoteApi;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::helpers::{author_line, media_line, STYLE_ACTIVE, STYLE_DIM, STYLE_NORMAL};

/// Render the full-screen pager.
///
/// While scrolling between two pages, both are shown with heights
/// proportional to their visible fractions.
pub fn render<A: RemoteApi>(f: &mut Frame, app: &App<A>, area: Rect) {
    if area.height < 3 {
        return;
    }

    let window = app.viewport();
    let visible: Vec<_> = window
        .entries()
        .iter()
        .filter(|e| e.fraction > 0.0)
        .copied()
        .collect();

    if visible.len() < 2 {
        if let Some(entry) = visible.first() {
            render_page(f, app, entry.index, area);
        }
        return;
    }

    let top = (visible[0].fraction * 100.0).round() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(top), Constraint::Min(0)])
        .split(area);
    render_page(f, app, visible[0].index, chunks[0]);
    render_page(f, app, visible[1].index, chunks[1]);
}

fn render_page<A: RemoteApi>(f: &mut Frame, app: &App<A>, index: usize, area: Rect) {
    let Some(item) = app.feed.items().get(index) else {
        return;
    };
    let inner_width = area.width.saturating_sub(2) as usize;
    let border_style = if app.feed.active_index() == Some(index) {
        STYLE_ACTIVE
    } else {
        STYLE_NORMAL
    };

    let mut lines = vec![
        author_line(app, index, inner_width),
        Line::default(),
        media_line(app, index),
        Line::default(),
    ];
    if item.description.is_empty() {
        lines.push(Line::styled("(no description)", STYLE_DIM));
    } else {
        lines.push(Line::raw(item.description.clone()));
    }
    if let Some(ts) = item.timestamp {
        lines.push(Line::default());
        lines.push(Line::styled(ts.format("%Y-%m-%d %H:%M").to_string(), STYLE_DIM));
    }

    let title = format!(" {}/{} ", index + 1, app.feed.items().len());
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        );
    f.render_widget(paragraph, area);
}
