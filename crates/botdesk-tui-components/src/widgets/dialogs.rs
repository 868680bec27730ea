//! Dialog widgets for confirmations and inputs.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::theme::Theme;

/// Create a centered rectangle within the given area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// A yes/no confirmation dialog.
#[derive(Debug, Clone)]
pub struct ConfirmDialog<'a> {
    title: &'a str,
    message: &'a str,
    secondary: Option<&'a str>,
    width: u16,
    height: u16,
    theme: Theme,
}

impl<'a> ConfirmDialog<'a> {
    pub fn new(title: &'a str, message: &'a str) -> Self {
        Self {
            title,
            message,
            secondary: None,
            width: 40,
            height: 7,
            theme: Theme::default(),
        }
    }

    /// Muted line under the question, e.g. what the action applies to.
    pub fn secondary(mut self, message: &'a str) -> Self {
        self.secondary = Some(message);
        self.height = 9;
        self
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines = vec![Line::from(""), Line::from(self.message)];

        if let Some(secondary) = self.secondary {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(secondary, self.theme.muted_style())));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(
                "[Y]",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("es  "),
            Span::styled(
                "[N]",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw("o"),
        ]));
        lines
    }

    pub fn render(self, frame: &mut Frame) {
        let area = centered_rect(self.width, self.height, frame.area());

        frame.render_widget(Clear, area);

        let paragraph = Paragraph::new(self.lines())
            .block(
                Block::default()
                    .title(format!(" {} ", self.title))
                    .borders(Borders::ALL)
                    .border_style(self.theme.focused_border()),
            )
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
    }
}

/// Display helper for a single-line input with a cursor marker.
#[derive(Debug, Clone)]
pub struct InputField<'a> {
    value: &'a str,
    cursor: usize,
    focused: bool,
    placeholder: Option<&'a str>,
    theme: Theme,
}

impl<'a> InputField<'a> {
    /// Create a field with the cursor at the end of `value`.
    pub fn new(value: &'a str) -> Self {
        Self {
            value,
            cursor: value.chars().count(),
            focused: false,
            placeholder: None,
            theme: Theme::default(),
        }
    }

    pub fn cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// Text to draw, with `|` at the cursor when focused.
    pub fn render_text(&self) -> String {
        if self.value.is_empty() {
            if let Some(placeholder) = self.placeholder {
                return if self.focused {
                    format!("|{}", placeholder)
                } else {
                    placeholder.to_string()
                };
            }
        }

        if self.focused {
            let cursor_pos = self.cursor.min(self.value.chars().count());
            let before: String = self.value.chars().take(cursor_pos).collect();
            let after: String = self.value.chars().skip(cursor_pos).collect();
            format!("{}|{}", before, after)
        } else {
            self.value.to_string()
        }
    }

    fn style(&self) -> Style {
        if self.value.is_empty() && self.placeholder.is_some() {
            self.theme.muted_style()
        } else if self.focused {
            Style::default().fg(Color::White)
        } else {
            Style::default()
        }
    }

    /// Styled line for embedding in a paragraph.
    pub fn line(&self, indent: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::raw(indent),
            Span::styled(self.render_text(), self.style()),
        ])
    }
}

/// A modal with one text input, optional notices and a key hint.
#[derive(Debug, Clone)]
pub struct InputDialog<'a> {
    title: &'a str,
    prompt: &'a str,
    field: InputField<'a>,
    /// Lines drawn above the prompt.
    preamble: Vec<Line<'a>>,
    /// Lines drawn under the input (notices, errors).
    notices: Vec<Line<'a>>,
    hint: &'a str,
    width: u16,
    theme: Theme,
}

impl<'a> InputDialog<'a> {
    pub fn new(title: &'a str, prompt: &'a str, field: InputField<'a>) -> Self {
        Self {
            title,
            prompt,
            field: field.focused(true),
            preamble: Vec::new(),
            notices: Vec::new(),
            hint: "[Enter] Submit  [Esc] Cancel",
            width: 60,
            theme: Theme::default(),
        }
    }

    pub fn preamble(mut self, line: Line<'a>) -> Self {
        self.preamble.push(line);
        self
    }

    /// Success or info text under the input.
    pub fn info(mut self, text: Option<&'a str>) -> Self {
        if let Some(text) = text {
            self.notices
                .push(Line::from(Span::styled(text, self.theme.success_style())));
        }
        self
    }

    /// Error text under the input.
    pub fn error(mut self, text: Option<&'a str>) -> Self {
        if let Some(text) = text {
            self.notices
                .push(Line::from(Span::styled(text, self.theme.error_style())));
        }
        self
    }

    pub fn hint(mut self, hint: &'a str) -> Self {
        self.hint = hint;
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn render(self, frame: &mut Frame) {
        let mut lines = vec![Line::from("")];
        lines.extend(self.preamble);
        if lines.len() > 1 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            self.prompt,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(self.field.line("> "));
        lines.push(Line::from(""));
        if !self.notices.is_empty() {
            lines.extend(self.notices);
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(self.hint, self.theme.muted_style())));

        let height = lines.len() as u16 + 2;
        let area = centered_rect(self.width, height, frame.area());
        frame.render_widget(Clear, area);

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.focused_border())
                    .title(format!(" {} ", self.title)),
            );

        frame.render_widget(paragraph, area);
    }
}
