use crate::app::App;
use crate::feed::RemoteApi;
use crate::util::{single_line, truncate_to_width};
use ratatui::{
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::helpers::{author_line, media_line, STYLE_ACTIVE, STYLE_CURSOR, STYLE_DIM, STYLE_NORMAL};

/// Height of one grid cell including its border.
pub(super) const CELL_HEIGHT: u16 = 5;

/// Render the multi-column grid. Updates `app.visible_rows` to what fits.
pub fn render<A: RemoteApi>(f: &mut Frame, app: &mut App<A>, area: Rect) {
    if area.width < app.grid_columns as u16 * 4 || area.height < CELL_HEIGHT {
        return;
    }

    app.visible_rows = (area.height / CELL_HEIGHT).max(1) as usize;
    let columns = app.grid_columns;
    let cell_width = area.width / columns as u16;
    let items = app.feed.items().clone();
    let active = app.feed.active_index();

    for row in 0..app.visible_rows {
        for col in 0..columns {
            let index = (app.first_row + row) * columns + col;
            if index >= items.len() {
                return;
            }
            let cell = Rect {
                x: area.x + col as u16 * cell_width,
                y: area.y + row as u16 * CELL_HEIGHT,
                width: cell_width,
                height: CELL_HEIGHT,
            };

            let border_style = if index == app.cursor {
                STYLE_CURSOR
            } else if Some(index) == active {
                STYLE_ACTIVE
            } else {
                STYLE_NORMAL
            };
            let inner_width = cell_width.saturating_sub(2) as usize;
            let description = if items[index].description.is_empty() {
                Line::styled("(no description)", STYLE_DIM)
            } else {
                let flat = single_line(&items[index].description);
                Line::raw(truncate_to_width(&flat, inner_width).into_owned())
            };

            let paragraph = Paragraph::new(vec![
                author_line(app, index, inner_width),
                description,
                media_line(app, index),
            ])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(format!(" {} ", index + 1)),
            );
            f.render_widget(paragraph, cell);
        }
    }
}
