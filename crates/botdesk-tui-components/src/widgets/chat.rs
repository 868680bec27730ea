//! Chat widget for displaying conversation messages.

use chrono::{DateTime, Local, Utc};
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::theme::Theme;
use crate::utils::{wrap_text, wrap_text_indented};

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Bot,
}

/// A single chat message as shown on screen.
#[derive(Debug, Clone)]
pub struct ChatMessage<'a> {
    pub role: ChatRole,
    pub content: &'a str,
    pub timestamp: DateTime<Utc>,
    /// Labels of the quick replies offered with this message.
    pub quick_replies: Vec<&'a str>,
}

/// Scrollable conversation view.
///
/// Quick replies are drawn under every message that has them; any of them
/// can be highlighted by message and button index.
#[derive(Debug, Clone)]
pub struct ChatWidget<'a> {
    messages: &'a [ChatMessage<'a>],
    /// Shown in place of the history when there are no messages.
    empty_text: Option<&'a str>,
    typing: bool,
    error: Option<&'a str>,
    /// (message index, button index)
    selected_quick_reply: Option<(usize, usize)>,
    bot_name: &'a str,
    /// Lines scrolled back from the newest (0 = pinned to the bottom).
    scroll_back: usize,
    focused: bool,
    theme: Theme,
}

impl<'a> ChatWidget<'a> {
    pub fn new(messages: &'a [ChatMessage<'a>]) -> Self {
        Self {
            messages,
            empty_text: None,
            typing: false,
            error: None,
            selected_quick_reply: None,
            bot_name: "Bot",
            scroll_back: 0,
            focused: false,
            theme: Theme::default(),
        }
    }

    /// Greeting shown while the history is empty.
    pub fn empty_text(mut self, text: &'a str) -> Self {
        self.empty_text = Some(text);
        self
    }

    /// Show the typing indicator.
    pub fn typing(mut self, typing: bool) -> Self {
        self.typing = typing;
        self
    }

    /// Show an inline error under the history.
    pub fn error(mut self, error: Option<&'a str>) -> Self {
        self.error = error;
        self
    }

    /// Highlight button `.1` of message `.0`.
    pub fn selected_quick_reply(mut self, selected: Option<(usize, usize)>) -> Self {
        self.selected_quick_reply = selected;
        self
    }

    pub fn bot_name(mut self, name: &'a str) -> Self {
        self.bot_name = name;
        self
    }

    /// Scroll back `lines` from the newest message.
    pub fn scroll_back(mut self, lines: usize) -> Self {
        self.scroll_back = lines;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn quick_reply_lines(
        &self,
        labels: &[&str],
        selected: Option<usize>,
        width: usize,
    ) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let mut spans: Vec<Span<'static>> = vec![Span::raw("  ")];
        let mut used = 2;

        for (i, label) in labels.iter().enumerate() {
            let button = format!("[ {} ]", label);
            let button_width = button.chars().count() + 1;
            if used + button_width > width && spans.len() > 1 {
                lines.push(Line::from(std::mem::replace(&mut spans, vec![Span::raw("  ")])));
                used = 2;
            }
            let style = if selected == Some(i) {
                self.theme.selected_quick_reply_style()
            } else {
                self.theme.quick_reply_style()
            };
            spans.push(Span::styled(button, style));
            spans.push(Span::raw(" "));
            used += button_width;
        }

        if spans.len() > 1 {
            lines.push(Line::from(spans));
        }
        lines
    }

    fn build_lines(&self, text_width: usize) -> Vec<Line<'static>> {
        let mut all_lines: Vec<Line<'static>> = Vec::new();

        if self.messages.is_empty() {
            if let Some(empty) = self.empty_text {
                all_lines.push(Line::from(""));
                for wrapped in wrap_text_indented(empty, text_width, "  ") {
                    all_lines.push(Line::from(Span::styled(wrapped, self.theme.muted_style())));
                }
            }
        }

        for (i, msg) in self.messages.iter().enumerate() {
            let (name, style) = match msg.role {
                ChatRole::User => ("You".to_string(), self.theme.user_style()),
                ChatRole::Bot => (self.bot_name.to_string(), self.theme.bot_style()),
            };

            all_lines.push(Line::from(vec![
                Span::styled(name, style.add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::styled(
                    msg.timestamp.with_timezone(&Local).format("%H:%M").to_string(),
                    self.theme.muted_style(),
                ),
            ]));

            for wrapped_line in wrap_text_indented(msg.content, text_width, "  ") {
                all_lines.push(Line::from(Span::raw(wrapped_line)));
            }

            if !msg.quick_replies.is_empty() {
                let selected = self
                    .selected_quick_reply
                    .filter(|(message, _)| *message == i)
                    .map(|(_, button)| button);
                all_lines.extend(self.quick_reply_lines(&msg.quick_replies, selected, text_width));
            }

            all_lines.push(Line::from(""));
        }

        if self.typing {
            all_lines.push(Line::from(vec![
                Span::styled(
                    self.bot_name.to_string(),
                    self.theme.bot_style().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    " is typing...",
                    self.theme.muted_style().add_modifier(Modifier::ITALIC),
                ),
            ]));
        }

        if let Some(error) = self.error {
            for wrapped in wrap_text(&format!("! {}", error), text_width) {
                all_lines.push(Line::from(Span::styled(wrapped, self.theme.error_style())));
            }
        }

        all_lines
    }

    /// Render the widget.
    pub fn render(self, frame: &mut Frame, area: Rect) {
        let border_style = if self.focused {
            self.theme.focused_border()
        } else {
            self.theme.unfocused_border()
        };

        let visible_height = area.height.saturating_sub(2) as usize;
        let text_width = area.width.saturating_sub(2) as usize;

        let all_lines = self.build_lines(text_width);
        let total_lines = all_lines.len();

        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll_offset = max_scroll.saturating_sub(self.scroll_back);

        let lines: Vec<Line> = all_lines
            .into_iter()
            .skip(scroll_offset)
            .take(visible_height)
            .collect();

        let title = if total_lines > visible_height {
            let first_line = scroll_offset + 1;
            let last_line = (scroll_offset + visible_height).min(total_lines);
            format!(" Chat [{}-{}/{}] ", first_line, last_line, total_lines)
        } else {
            " Chat ".to_string()
        };

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        );

        frame.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn message<'a>(
        role: ChatRole,
        content: &'a str,
        quick_replies: Vec<&'a str>,
    ) -> ChatMessage<'a> {
        ChatMessage {
            role,
            content,
            timestamp: Utc::now(),
            quick_replies,
        }
    }

    #[test]
    fn test_empty_history_shows_greeting() {
        let messages: Vec<ChatMessage> = Vec::new();
        let widget = ChatWidget::new(&messages).empty_text("Hello Ana!");
        let lines = widget.build_lines(40);
        assert!(lines.iter().any(|l| text_of(l).contains("Hello Ana!")));
    }

    #[test]
    fn test_quick_replies_rendered_as_buttons() {
        let messages = vec![message(ChatRole::Bot, "Pick", vec!["Yes", "No"])];
        let widget = ChatWidget::new(&messages).selected_quick_reply(Some((0, 1)));
        let lines = widget.build_lines(40);
        let buttons = lines
            .iter()
            .map(text_of)
            .find(|t| t.contains("[ Yes ]"))
            .unwrap();
        assert!(buttons.contains("[ No ]"));
    }

    #[test]
    fn test_selection_on_older_message_is_highlighted() {
        let messages = vec![
            message(ChatRole::Bot, "Pick", vec!["Yes", "No"]),
            message(ChatRole::Bot, "Anything else?", vec!["Done"]),
        ];
        let theme = Theme::default();
        let widget = ChatWidget::new(&messages).selected_quick_reply(Some((0, 1)));
        let lines = widget.build_lines(40);

        let style_of = |label: &str| {
            lines
                .iter()
                .flat_map(|l| l.spans.iter())
                .find(|s| s.content == format!("[ {} ]", label))
                .map(|s| s.style)
                .unwrap()
        };
        assert_eq!(style_of("No"), theme.selected_quick_reply_style());
        assert_eq!(style_of("Yes"), theme.quick_reply_style());
        assert_eq!(style_of("Done"), theme.quick_reply_style());
    }

    #[test]
    fn test_typing_and_error_follow_history() {
        let messages = vec![message(ChatRole::User, "hi", Vec::new())];
        let widget = ChatWidget::new(&messages)
            .typing(true)
            .error(Some("Could not connect"));
        let lines: Vec<String> = widget.build_lines(40).iter().map(text_of).collect();

        let typing = lines.iter().position(|l| l.contains("is typing")).unwrap();
        let error = lines.iter().position(|l| l.contains("Could not connect")).unwrap();
        assert!(typing < error);
    }

    #[test]
    fn test_buttons_wrap_to_width() {
        let messages = vec![message(ChatRole::Bot, "Pick", vec!["First", "Second", "Third"])];
        let widget = ChatWidget::new(&messages);
        let button_lines = widget
            .build_lines(20)
            .iter()
            .map(text_of)
            .filter(|t| t.contains("[ "))
            .count();
        assert!(button_lines > 1);
    }
}
