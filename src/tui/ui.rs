//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Focus};
use super::theme;
use super::widgets::{chat, header, input, notice, sidebar};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Block,
    Frame,
};

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    frame.render_widget(Block::default().style(theme::base()), area);

    // Main layout: header, content
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(5),    // Sidebar + chat column
        ])
        .split(area);

    // Content layout: sidebar (32%) and chat column
    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
        .split(main_layout[1]);

    let notice_height = u16::from(app.notice.is_some());
    let chat_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),                // Chat history
            Constraint::Length(notice_height), // Notice
            Constraint::Length(3),             // Question box
        ])
        .split(content_layout[1]);

    render_header(frame, main_layout[0], app);
    frame.render_widget(sidebar::Sidebar::new(app), content_layout[0]);
    render_chat(frame, chat_layout[0], app);
    if let Some(n) = &app.notice {
        frame.render_widget(notice::NoticeBar::new(n), chat_layout[1]);
    }
    render_input(frame, chat_layout[2], app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let widget = header::Header::new(app.session.connection_info());
    frame.render_widget(widget, area);
}

fn render_chat(frame: &mut Frame, area: Rect, app: &App) {
    let widget = chat::ChatPanel::new(
        app.session.history().turns(),
        app.chat_scroll,
        app.is_processing,
    );
    frame.render_widget(widget, area);
}

/// Renders the question box.
fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Question;
    let widget = input::InputBar::new(&app.question.text, app.question.cursor, focused);
    frame.render_widget(widget, area);

    // Position cursor in input field when focused
    if focused {
        // Account for border (1) and prompt "> " (2)
        let available = area.width.saturating_sub(5) as usize;
        let visible_cursor = app.question.cursor
            - input::calculate_scroll_offset(app.question.cursor, available);
        let cursor_x = area.x + 1 + 2 + visible_cursor as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}
