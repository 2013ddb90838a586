//! Question box widget for the TUI.
//!
//! Provides a single-line text input with cursor support and a placeholder.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::tui::theme;

pub const PLACEHOLDER: &str = "💭 Ask anything from the database...";

/// Calculates the scroll offset needed to keep the cursor visible.
///
/// Returns the number of characters to skip from the start of the text.
pub fn calculate_scroll_offset(cursor: usize, available_width: usize) -> usize {
    cursor.saturating_sub(available_width)
}

/// Question box widget.
pub struct InputBar<'a> {
    text: &'a str,
    cursor: usize,
    focused: bool,
}

impl<'a> InputBar<'a> {
    pub fn new(text: &'a str, cursor: usize, focused: bool) -> Self {
        Self {
            text,
            cursor,
            focused,
        }
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border(self.focused))
            .style(theme::base());

        let prompt = Span::styled(
            "> ",
            theme::base().fg(theme::PINK).add_modifier(Modifier::BOLD),
        );

        let line = if self.text.is_empty() {
            Line::from(vec![prompt, Span::styled(PLACEHOLDER, theme::placeholder())])
        } else {
            // Border left (1) + prompt "> " (2) + border right (1) + cursor space (1) = 5
            let available_width = area.width.saturating_sub(5) as usize;
            let offset = calculate_scroll_offset(self.cursor, available_width);
            let visible: String = self.text.chars().skip(offset).collect();
            Line::from(vec![prompt, Span::styled(visible, theme::base())])
        };

        Paragraph::new(line).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(text: &str, cursor: usize, width: u16) -> String {
        let area = Rect::new(0, 0, width, 3);
        let mut buf = Buffer::empty(area);
        InputBar::new(text, cursor, true).render(area, &mut buf);
        (0..width).map(|x| buf[(x, 1)].symbol().to_string()).collect()
    }

    #[test]
    fn test_placeholder_when_empty() {
        assert!(row("", 0, 60).contains("Ask anything from the database..."));
        assert!(!row("hi", 2, 60).contains("Ask anything"));
    }

    #[test]
    fn test_long_text_scrolls_to_cursor() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let shown = row(text, 26, 15);
        assert!(shown.contains("qrstuvwxyz"));
        assert!(!shown.contains("abc"));
    }

    #[test]
    fn test_scroll_offset() {
        assert_eq!(calculate_scroll_offset(5, 20), 0);
        assert_eq!(calculate_scroll_offset(20, 20), 0);
        assert_eq!(calculate_scroll_offset(25, 20), 5);
        assert_eq!(calculate_scroll_offset(5, 0), 5);
    }
}
