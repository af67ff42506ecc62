//! Shared formatting for item cards in both presentation modes.

use crate::app::App;
use crate::feed::{MediaKind, RemoteApi};
use crate::playback::MediaStatus;
use crate::util::truncate_to_width;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use std::time::Duration;

pub(super) const STYLE_ACTIVE: Style = Style::new().fg(Color::Yellow);
pub(super) const STYLE_CURSOR: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
pub(super) const STYLE_NORMAL: Style = Style::new().fg(Color::Gray);
pub(super) const STYLE_DIM: Style = Style::new().fg(Color::DarkGray);

/// Format a playback position as `m:ss`.
pub(super) fn format_position(position: Duration) -> String {
    let secs = position.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// `[A] alice` with the avatar initial as a badge.
pub(super) fn author_line<A: RemoteApi>(app: &App<A>, index: usize, width: usize) -> Line<'static> {
    let Some(author) = app.feed.author(index) else {
        return Line::default();
    };
    let badge = format!("[{}] ", author.initial());
    let name_width = width.saturating_sub(badge.chars().count());
    let style = if author.is_placeholder {
        STYLE_DIM
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    Line::from(vec![
        Span::styled(badge, STYLE_NORMAL),
        Span::styled(
            truncate_to_width(&author.display_name, name_width).into_owned(),
            style,
        ),
    ])
}

/// Play state, volume and mute markers for one item.
pub(super) fn media_line<A: RemoteApi>(app: &App<A>, index: usize) -> Line<'static> {
    let Some(item) = app.feed.items().get(index) else {
        return Line::default();
    };

    let mut spans = Vec::with_capacity(4);
    match app.feed.media_status(index) {
        None => {
            let label = match item.media_kind {
                MediaKind::Video => "▷ video",
                MediaKind::Image => "▣ image",
            };
            spans.push(Span::styled(label, STYLE_DIM));
        }
        Some(MediaStatus::Static) => spans.push(Span::styled("▣ image", STYLE_NORMAL)),
        Some(MediaStatus::Inert) => spans.push(Span::styled(
            "✖ media unavailable",
            Style::default().fg(Color::Red),
        )),
        Some(MediaStatus::Live {
            playing,
            volume,
            position,
        }) => {
            let state = if playing { "▶" } else { "⏸" };
            let at = position.map(format_position).unwrap_or_default();
            spans.push(Span::styled(format!("{state} {at}"), STYLE_NORMAL));
            let sound = if volume > 0.0 { " 🔊" } else { " 🔈" };
            spans.push(Span::raw(sound));
            if app.feed.is_muted(index) == Some(true) {
                spans.push(Span::styled(" muted", STYLE_DIM));
            }
        }
    }

    if item.has_document() {
        let lit = app
            .feed
            .attention(index)
            .map(|pulse| pulse.is_lit())
            .unwrap_or(false);
        let style = if lit {
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
        } else {
            STYLE_DIM
        };
        spans.push(Span::styled(" [doc]", style));
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(Duration::from_secs(0)), "0:00");
        assert_eq!(format_position(Duration::from_secs(75)), "1:15");
        assert_eq!(format_position(Duration::from_millis(9_999)), "0:09");
    }
}
