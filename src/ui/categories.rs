use crate::app::App;
use crate::feed::{Category, RemoteApi};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Tabs},
    Frame,
};

/// Render the category strip.
pub fn render<A: RemoteApi>(f: &mut Frame, app: &App<A>, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let titles = Category::ALL.iter().map(|c| c.as_str());
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", app.feed.kind())),
        )
        .select(app.feed.category().position())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .divider("|");

    f.render_widget(tabs, area);
}
