//! Terminal widgets for the botdesk chat client.
//!
//! The crate is organized into:
//! - `widgets` - ratatui widgets (header, footer, chat, dialogs)
//! - `theme` - Colors and styles
//! - `input` - Unicode-safe line editing
//! - `utils` - Text wrapping and truncation
//!
//! Widgets take plain strings and small view structs rather than the
//! engine's domain types, so the binary decides what is shown.

pub mod input;
pub mod theme;
pub mod utils;
pub mod widgets;

pub use input::LineEditor;
pub use theme::Theme;
pub use utils::{truncate, wrap_text, wrap_text_indented};
pub use widgets::chat::{ChatMessage, ChatRole, ChatWidget};
pub use widgets::dialogs::{centered_rect, ConfirmDialog, InputDialog, InputField};
pub use widgets::footer::Footer;
pub use widgets::header::{Header, StatusIndicator};
