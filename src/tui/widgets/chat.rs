//! Chat panel widget for the TUI.
//!
//! Replays the session's chat turns, newest at the bottom.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::session::ChatTurn;
use crate::tui::theme;

pub const THINKING: &str = "Thinking...";

/// Chat panel widget.
pub struct ChatPanel<'a> {
    turns: &'a [ChatTurn],
    scroll: usize,
    thinking: bool,
}

impl<'a> ChatPanel<'a> {
    pub fn new(turns: &'a [ChatTurn], scroll: usize, thinking: bool) -> Self {
        Self {
            turns,
            scroll,
            thinking,
        }
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        for turn in self.turns {
            lines.push(Line::from(Span::styled(
                turn.role.label(),
                theme::turn_label(turn.role),
            )));
            for text in turn.content.lines() {
                lines.push(Line::from(Span::styled(text, theme::turn(turn.role))));
            }
            lines.push(Line::from(""));
        }
        if self.thinking {
            lines.push(Line::from(Span::styled(THINKING, theme::placeholder())));
        }
        lines
    }
}

/// Estimates the rendered height of wrapped lines.
fn wrapped_height(lines: &[Line], width: u16) -> usize {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum()
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border(false))
            .style(theme::base())
            .title(" Chat ");

        let inner = block.inner(area);
        let lines = self.lines();

        // Keep the newest turn in view; `scroll` counts lines up from the bottom
        let total = wrapped_height(&lines, inner.width);
        let max_offset = total.saturating_sub(inner.height as usize);
        let offset = max_offset.saturating_sub(self.scroll.min(max_offset));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((offset.min(u16::MAX as usize) as u16, 0))
            .render(area, buf);
    }
}
