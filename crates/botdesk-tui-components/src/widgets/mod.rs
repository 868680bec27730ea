//! Reusable TUI widgets.

pub mod chat;
pub mod dialogs;
pub mod footer;
pub mod header;
