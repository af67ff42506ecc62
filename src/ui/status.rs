use crate::app::App;
use crate::feed::RemoteApi;
use crate::mode::PresentationMode;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub fn render<A: RemoteApi>(f: &mut Frame, app: &App<A>, area: Rect) {
    // Status bar needs at least 1 char width to be meaningful
    if area.width < 1 || area.height < 1 {
        return;
    }

    // Borrow the status message instead of cloning
    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if !app.feed.is_screen_focused() {
        Cow::Borrowed("Paused (screen unfocused) [f]ocus [q]uit")
    } else {
        match app.feed.mode() {
            PresentationMode::Grid => Cow::Borrowed(
                "[h/l]category [arrows/jk]move [Enter]play [o]pen doc [r]efresh [f]ocus [q]uit",
            ),
            PresentationMode::FullScreen => {
                Cow::Borrowed("[j/k]scroll [m]ute [o]pen doc [Esc]back [f]ocus [q]uit")
            }
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);

    let paragraph = Paragraph::new(text).style(style);
    f.render_widget(paragraph, area);
}
