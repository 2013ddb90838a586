//! Header widget for the TUI.
//!
//! Displays the title, the tagline and the database currently in use.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::tui::theme;

pub const TITLE: &str = "🦜 Chat with SQL DB 💬";
pub const TAGLINE: &str = "✨ Ask your database like a friend, every query tells a story! ✨";

/// Header widget. Two rows: title and tagline.
pub struct Header<'a> {
    connection_info: Option<&'a str>,
}

impl<'a> Header<'a> {
    pub fn new(connection_info: Option<&'a str>) -> Self {
        Self { connection_info }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, theme::title());

        let lines = vec![
            Line::from(Span::styled(TITLE, theme::title())),
            Line::from(Span::styled(TAGLINE, theme::tagline())),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(area, buf);

        // Right side of the title row, only where it clears the centered title
        if let Some(info) = self.connection_info {
            let text = format!(" [db: {info}] ");
            let width = Line::from(text.as_str()).width() as u16;
            let free = area.width.saturating_sub(Line::from(TITLE).width() as u16) / 2;
            if width < free {
                let x = area.right().saturating_sub(width);
                buf.set_string(x, area.y, &text, theme::tagline());
            }
        }
    }
}
