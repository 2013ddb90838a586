//! Ivory and pink color palette.

use ratatui::style::{Color, Modifier, Style};

use crate::app::NoticeLevel;
use crate::session::TurnRole;

pub const IVORY: Color = Color::Rgb(0xff, 0xfd, 0xf7);
pub const BLUSH: Color = Color::Rgb(0xff, 0xe4, 0xec);
pub const PINK: Color = Color::Rgb(0xff, 0x4b, 0x8b);
pub const SIDEBAR_BG: Color = Color::Rgb(0xff, 0xfa, 0xfc);
pub const USER_BG: Color = Color::Rgb(0xff, 0xee, 0xf5);
pub const ASSISTANT_BG: Color = Color::Rgb(0xf9, 0xf9, 0xf9);
pub const TEXT: Color = Color::Rgb(0x33, 0x33, 0x33);
pub const MUTED: Color = Color::Rgb(0x99, 0x88, 0x8f);

pub fn base() -> Style {
    Style::default().bg(IVORY).fg(TEXT)
}

pub fn title() -> Style {
    Style::default()
        .bg(BLUSH)
        .fg(PINK)
        .add_modifier(Modifier::BOLD)
}

pub fn tagline() -> Style {
    Style::default()
        .bg(BLUSH)
        .fg(PINK)
        .add_modifier(Modifier::ITALIC)
}

pub fn sidebar() -> Style {
    Style::default().bg(SIDEBAR_BG).fg(TEXT)
}

pub fn border(focused: bool) -> Style {
    if focused {
        Style::default().fg(PINK)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn placeholder() -> Style {
    Style::default().fg(MUTED).add_modifier(Modifier::ITALIC)
}

pub fn turn(role: TurnRole) -> Style {
    match role {
        TurnRole::User => Style::default().bg(USER_BG).fg(TEXT),
        TurnRole::Assistant => Style::default().bg(ASSISTANT_BG).fg(Color::Rgb(0x11, 0x11, 0x11)),
    }
}

pub fn turn_label(role: TurnRole) -> Style {
    turn(role).fg(PINK).add_modifier(Modifier::BOLD)
}

pub fn notice(level: NoticeLevel) -> Style {
    let fg = match level {
        NoticeLevel::Warning => Color::Rgb(0x9a, 0x67, 0x00),
        NoticeLevel::Error => Color::Rgb(0xc0, 0x1c, 0x28),
    };
    Style::default().bg(IVORY).fg(fg).add_modifier(Modifier::BOLD)
}

pub fn button(focused: bool) -> Style {
    if focused {
        Style::default()
            .bg(PINK)
            .fg(IVORY)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(BLUSH).fg(PINK)
    }
}
