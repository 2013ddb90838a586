//! Sidebar widget for the TUI.
//!
//! Database mode selector, remote connection fields, the API key field and
//! the clear history button.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::app::Field;
use crate::config::DatabaseMode;
use crate::tui::app::{App, Focus};
use crate::tui::theme;

pub const MODE_PROMPT: &str = "💾 Choose the DB you want to chat with";
pub const CLEAR_BUTTON: &str = "🧹 Clear chat history";

/// Sidebar widget.
pub struct Sidebar<'a> {
    app: &'a App,
}

impl<'a> Sidebar<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }

    fn mode_lines(&self) -> Vec<Line<'static>> {
        let focused = self.app.focus == Focus::ModeSelector;
        let mut lines = vec![Line::from(Span::styled(
            MODE_PROMPT,
            theme::sidebar().add_modifier(Modifier::BOLD),
        ))];

        for mode in [DatabaseMode::Embedded, DatabaseMode::Remote] {
            let selected = self.app.mode() == mode;
            let marker = if selected { "(●)" } else { "( )" };
            let mut style = theme::sidebar();
            if selected {
                style = style.fg(theme::PINK);
            }
            if selected && focused {
                style = style.add_modifier(Modifier::REVERSED);
            }
            lines.push(Line::from(Span::styled(
                format!(" {marker} {}", mode.label()),
                style,
            )));
        }
        lines
    }

    fn field_lines(&self, field: Field) -> Vec<Line<'static>> {
        let focused = self.app.focus == Focus::Field(field);
        let draft = &self.app.draft(field).text;

        let shown = if field.is_secret() {
            "•".repeat(draft.chars().count())
        } else {
            draft.clone()
        };
        let cursor = if focused { "▏" } else { "" };

        vec![
            Line::from(Span::styled(
                field.label(),
                theme::sidebar().add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled(" > ", theme::border(focused)),
                Span::styled(format!("{shown}{cursor}"), theme::sidebar()),
            ]),
        ]
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let focused = !matches!(self.app.focus, Focus::Question);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border(focused))
            .style(theme::sidebar())
            .title(" Settings ");

        let mut lines = self.mode_lines();
        lines.push(Line::from(""));

        if self.app.mode() == DatabaseMode::Remote {
            for field in [Field::Host, Field::User, Field::Password, Field::Database] {
                lines.extend(self.field_lines(field));
            }
            lines.push(Line::from(""));
        }

        lines.extend(self.field_lines(Field::ApiKey));
        lines.push(Line::from(""));

        let button_focused = self.app.focus == Focus::ClearButton;
        lines.push(Line::from(Span::styled(
            format!(" {CLEAR_BUTTON} "),
            theme::button(button_focused),
        )));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
