//! Inline notice widget for the TUI.
//!
//! A one-line bar above the question box for warnings and errors.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::app::{Notice, NoticeLevel};
use crate::tui::theme;

/// Notice bar widget.
pub struct NoticeBar<'a> {
    notice: &'a Notice,
}

impl<'a> NoticeBar<'a> {
    pub fn new(notice: &'a Notice) -> Self {
        Self { notice }
    }

    fn icon(&self) -> &'static str {
        match self.notice.level {
            NoticeLevel::Warning => "⚠️",
            NoticeLevel::Error => "❌",
        }
    }
}

impl Widget for NoticeBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = theme::notice(self.notice.level);
        buf.set_style(area, style);

        // Truncate message if needed
        let max_len = area.width.saturating_sub(4) as usize;
        let message = if self.notice.message.chars().count() > max_len {
            let cut: String = self
                .notice
                .message
                .chars()
                .take(max_len.saturating_sub(1))
                .collect();
            format!("{cut}…")
        } else {
            self.notice.message.clone()
        };

        let line = Line::from(vec![
            Span::styled(format!("{} ", self.icon()), style),
            Span::styled(message, style),
        ]);
        Paragraph::new(line).render(area, buf);
    }
}
