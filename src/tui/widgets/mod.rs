//! TUI widgets for dbchat.
//!
//! Contains reusable UI components.

pub mod chat;
pub mod header;
pub mod input;
pub mod notice;
pub mod sidebar;
