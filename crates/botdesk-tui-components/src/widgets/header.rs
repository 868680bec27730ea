//! Header widget for TUI applications.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::theme::Theme;

/// Status indicator for the header.
#[derive(Debug, Clone)]
pub struct StatusIndicator {
    pub label: String,
    pub color: Color,
}

impl StatusIndicator {
    pub fn new(label: impl Into<String>, color: Color) -> Self {
        Self {
            label: label.into(),
            color,
        }
    }

    pub fn success(label: impl Into<String>) -> Self {
        Self::new(label, Color::Green)
    }

    pub fn error(label: impl Into<String>) -> Self {
        Self::new(label, Color::Red)
    }
}

/// Header with title, subtitle, status and an account label on the right.
#[derive(Debug, Clone)]
pub struct Header<'a> {
    title: &'a str,
    subtitle: Option<&'a str>,
    status: Option<StatusIndicator>,
    /// Right-aligned text, e.g. the signed-in user or a login hint.
    account: Option<String>,
    theme: Theme,
}

impl<'a> Header<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            subtitle: None,
            status: None,
            account: None,
            theme: Theme::default(),
        }
    }

    pub fn subtitle(mut self, subtitle: &'a str) -> Self {
        if !subtitle.is_empty() {
            self.subtitle = Some(subtitle);
        }
        self
    }

    pub fn status(mut self, status: StatusIndicator) -> Self {
        self.status = Some(status);
        self
    }

    pub fn account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.unfocused_border());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let account_width = self
            .account
            .as_ref()
            .map(|a| a.chars().count() as u16 + 2)
            .unwrap_or(0);
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(account_width)])
            .split(inner);

        let mut spans = vec![Span::styled(
            format!(" {} ", self.title),
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(status) = &self.status {
            spans.push(Span::styled("● ", Style::default().fg(status.color)));
            spans.push(Span::styled(
                status.label.clone(),
                Style::default().fg(status.color),
            ));
        }
        if let Some(subtitle) = self.subtitle {
            spans.push(Span::styled(
                format!("  {}", subtitle),
                self.theme.muted_style(),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);

        if let Some(account) = self.account {
            let paragraph = Paragraph::new(Line::from(Span::styled(
                format!("{} ", account),
                self.theme.bold(),
            )))
            .alignment(Alignment::Right);
            frame.render_widget(paragraph, chunks[1]);
        }
    }
}
