//! Footer widget for TUI applications.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::theme::Theme;

/// One-line footer: an optional status message followed by key help.
#[derive(Debug, Clone)]
pub struct Footer<'a> {
    help: &'a str,
    status: Option<&'a str>,
    theme: Theme,
}

impl<'a> Footer<'a> {
    pub fn new(help: &'a str) -> Self {
        Self {
            help,
            status: None,
            theme: Theme::default(),
        }
    }

    pub fn status(mut self, status: Option<&'a str>) -> Self {
        self.status = status;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        if let Some(status) = self.status {
            spans.push(Span::styled(status, self.theme.warning_style()));
            spans.push(Span::raw(" | "));
        }
        spans.push(Span::styled(self.help, self.theme.muted_style()));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
