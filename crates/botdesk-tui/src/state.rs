//! UI state for rendering.

use botdesk_engine::identity::IdentitySnapshot;
use botdesk_engine::AuthForm;
use botdesk_tui_components::LineEditor;

/// Which part of the chat screen receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    QuickReplies,
}

/// A quick-reply button: index of its message in the history and of the
/// button within that message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuickReplyCursor {
    pub message: usize,
    pub button: usize,
}

/// Screen-local state. Conversation data lives in the engine and identity
/// data in the snapshot copied from the store.
#[derive(Debug, Default)]
pub struct UiState {
    pub focus: Focus,

    /// The chat input line.
    pub input: LineEditor,

    /// Lines scrolled back from the newest message.
    pub scroll_back: usize,

    /// Highlighted quick reply.
    pub selected_quick_reply: QuickReplyCursor,

    /// Latest identity snapshot seen by the UI.
    pub identity: IdentitySnapshot,

    pub auth_form: AuthForm,

    /// Endpoint panel is open, editing this value.
    pub config_input: Option<LineEditor>,

    /// Sign-out confirmation is showing.
    pub confirm_sign_out: bool,

    /// Transient message shown in the footer.
    pub status_message: Option<String>,
}

impl UiState {
    /// Jump back to the newest message after the history changed.
    pub fn follow_newest(&mut self) {
        self.scroll_back = 0;
        self.selected_quick_reply = QuickReplyCursor::default();
        self.focus = Focus::Input;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }
}
