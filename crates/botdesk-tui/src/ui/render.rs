//! Main render function for the chat screen.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use botdesk_client::webhook_url;
use botdesk_core::Origin;
use botdesk_engine::{AuthStep, ConversationEngine};
use botdesk_tui_components::{
    centered_rect, truncate, ChatMessage, ChatRole, ChatWidget, ConfirmDialog, Footer, Header,
    InputDialog, InputField, LineEditor, StatusIndicator, Theme,
};

use crate::config::ChatConfig;
use crate::state::{Focus, UiState};

/// Widest user name shown on the account button.
const ACCOUNT_NAME_WIDTH: usize = 24;

/// Render the whole screen, overlays last.
pub fn render(
    frame: &mut Frame,
    config: &ChatConfig,
    engine: &ConversationEngine,
    state: &UiState,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Conversation
            Constraint::Length(3), // Input line
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    render_header(frame, chunks[0], config, engine, state);
    render_chat(frame, chunks[1], config, engine, state);
    render_input(frame, chunks[2], config, engine, state);
    render_footer(frame, chunks[3], engine, state);

    if let Some(editor) = &state.config_input {
        render_config_panel(frame, engine, editor);
    }
    if state.identity.profile_open {
        render_profile(frame, state);
    }
    if state.identity.auth_modal_open {
        render_auth_modal(frame, state);
    }
    if state.confirm_sign_out {
        let mut dialog = ConfirmDialog::new("Sign out", "Sign out of your account?");
        if let Some(email) = state.identity.user().and_then(|u| u.email.as_deref()) {
            dialog = dialog.secondary(email);
        }
        dialog.render(frame);
    }
}

fn render_header(
    frame: &mut Frame,
    area: Rect,
    config: &ChatConfig,
    engine: &ConversationEngine,
    state: &UiState,
) {
    let status = if engine.is_connected() {
        StatusIndicator::success("Connected")
    } else {
        StatusIndicator::error("Disconnected")
    };

    let mut header = Header::new(&config.title)
        .subtitle(&config.subtitle)
        .status(status);

    // The account button stays hidden until the session lookup resolves.
    if !state.identity.loading {
        header = match state.identity.user() {
            Some(user) => header.account(format!(
                "{} [{}]  ^L",
                truncate(&user.display_name(), ACCOUNT_NAME_WIDTH),
                user.initial()
            )),
            None => header.account("Login  ^L"),
        };
    }

    header.render(frame, area);
}

fn greeting(state: &UiState) -> String {
    match state.identity.user().and_then(|u| u.first_name()) {
        Some(name) => format!("Hi {}! How can I help you today?", name),
        None => "Hi! How can I help you today?".to_string(),
    }
}

fn render_chat(
    frame: &mut Frame,
    area: Rect,
    config: &ChatConfig,
    engine: &ConversationEngine,
    state: &UiState,
) {
    let messages: Vec<ChatMessage> = engine
        .messages()
        .iter()
        .map(|m| ChatMessage {
            role: match m.origin() {
                Origin::User => ChatRole::User,
                Origin::Bot => ChatRole::Bot,
            },
            content: m.text(),
            timestamp: m.timestamp(),
            quick_replies: m.quick_replies().iter().map(|q| q.label.as_str()).collect(),
        })
        .collect();

    let greeting = greeting(state);
    let cursor = state.selected_quick_reply;
    let selected = (state.focus == Focus::QuickReplies).then_some((cursor.message, cursor.button));

    ChatWidget::new(&messages)
        .empty_text(&greeting)
        .typing(engine.is_awaiting_reply())
        .error(engine.last_error().map(|e| e.message.as_str()))
        .selected_quick_reply(selected)
        .bot_name(&config.bot_name)
        .scroll_back(state.scroll_back)
        .focused(state.focus == Focus::QuickReplies)
        .render(frame, area);
}

fn render_input(
    frame: &mut Frame,
    area: Rect,
    config: &ChatConfig,
    engine: &ConversationEngine,
    state: &UiState,
) {
    let theme = Theme::default();
    let awaiting = engine.is_awaiting_reply();
    let focused = state.focus == Focus::Input && !awaiting;
    let placeholder = if awaiting {
        "Waiting for reply..."
    } else {
        config.input_hint.as_str()
    };

    let field = InputField::new(state.input.value())
        .cursor(state.input.cursor())
        .focused(focused)
        .placeholder(placeholder);

    let border = if focused {
        theme.focused_border()
    } else {
        theme.unfocused_border()
    };
    let paragraph = Paragraph::new(field.line(" ")).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(" Message "),
    );
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, area: Rect, engine: &ConversationEngine, state: &UiState) {
    let help = match state.focus {
        Focus::Input => {
            " Enter: send | Tab: quick replies | ^L: account | ^E: endpoint | ^R: reconnect | ^C: quit "
        }
        Focus::QuickReplies => {
            " ←/→: choose | ↑/↓: other message | Enter: select | Tab/Esc: back to input "
        }
    };
    let status = state
        .status_message
        .as_deref()
        .or_else(|| engine.connection_error().map(|e| e.message.as_str()));

    Footer::new(help).status(status).render(frame, area);
}

fn render_config_panel(frame: &mut Frame, engine: &ConversationEngine, editor: &LineEditor) {
    let theme = Theme::default();
    let state_line = if engine.is_connected() {
        Span::styled("Connected", theme.success_style())
    } else {
        Span::styled("Disconnected", theme.error_style())
    };

    let field = InputField::new(editor.value()).cursor(editor.cursor());
    InputDialog::new("Dialogue endpoint", "Endpoint URL", field)
        .preamble(Line::from(vec![Span::raw("State:   "), state_line]))
        .preamble(Line::from(vec![
            Span::raw("Webhook: "),
            Span::styled(webhook_url(editor.value()), theme.muted_style()),
        ]))
        .error(engine.connection_error().map(|e| e.message.as_str()))
        .hint("[Enter] Apply and test  [Esc] Cancel")
        .width(70)
        .render(frame);
}

fn render_profile(frame: &mut Frame, state: &UiState) {
    let Some(user) = state.identity.user() else {
        return;
    };
    let theme = Theme::default();

    let name = user.full_name();
    let name = if name.is_empty() { user.display_name() } else { name };
    let verified = if user.is_email_verified() {
        Span::styled("verified", theme.success_style())
    } else {
        Span::styled("not verified", theme.warning_style())
    };
    let last_sign_in = user
        .last_sign_in_at
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!(" ({}) ", user.initial()), theme.bold()),
            Span::styled(name, theme.bold()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw(" Email:        "),
            Span::raw(user.email.clone().unwrap_or_default()),
            Span::raw(" "),
            verified,
        ]),
        Line::from(format!(" Last sign in: {}", last_sign_in)),
        Line::from(""),
        Line::from(Span::styled(
            " [s] Sign out  [Esc] Close",
            theme.muted_style(),
        )),
    ];

    let area = centered_rect(56, lines.len() as u16 + 2, frame.area());
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.focused_border())
                .title(" Profile "),
        ),
        area,
    );
}

fn render_auth_modal(frame: &mut Frame, state: &UiState) {
    let form = &state.auth_form;

    let dialog = match form.step() {
        AuthStep::Email => {
            let field = InputField::new(form.email()).placeholder("you@example.com");
            InputDialog::new("Sign in", "Email", field)
                .preamble(Line::from("We will email you a 6-digit sign-in code."))
                .hint(if form.is_loading() {
                    "Sending code..."
                } else {
                    "[Enter] Send code  [Esc] Close"
                })
        }
        AuthStep::Otp => {
            let field = InputField::new(form.code()).placeholder("123456");
            InputDialog::new("Sign in", "6-digit code", field)
                .preamble(Line::from(format!("Code sent to {}", form.email())))
                .hint(if form.is_loading() {
                    "Verifying..."
                } else {
                    "[Enter] Verify  [Esc] Back"
                })
        }
    };

    dialog.info(form.info()).error(form.error()).render(frame);
}
