//! Theme and style definitions.

use ratatui::style::{Color, Modifier, Style};

/// Colors used across the chat client.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primary accent color (focused borders, active elements)
    pub accent: Color,
    /// Connected, success notices
    pub success: Color,
    /// Pending states, typing indicator
    pub warning: Color,
    /// Errors, disconnected
    pub error: Color,
    /// Timestamps and secondary info
    pub muted: Color,
    /// User message color
    pub user: Color,
    /// Bot message color
    pub bot: Color,
    /// Quick-reply buttons
    pub quick_reply: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::DarkGray,
            user: Color::Cyan,
            bot: Color::Green,
            quick_reply: Color::Magenta,
        }
    }
}

impl Theme {
    pub fn focused_border(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn unfocused_border(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn bold(&self) -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    pub fn user_style(&self) -> Style {
        Style::default().fg(self.user)
    }

    pub fn bot_style(&self) -> Style {
        Style::default().fg(self.bot)
    }

    /// Style for an unselected quick-reply button.
    pub fn quick_reply_style(&self) -> Style {
        Style::default().fg(self.quick_reply)
    }

    /// Style for the quick-reply button under the cursor.
    pub fn selected_quick_reply_style(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.quick_reply)
            .add_modifier(Modifier::BOLD)
    }
}
