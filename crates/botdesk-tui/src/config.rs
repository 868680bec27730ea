//! Client configuration.

use botdesk_engine::conversation::DEFAULT_ENDPOINT;

/// Presentation and endpoint settings for the chat screen.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the dialogue service.
    pub endpoint: String,
    pub title: String,
    pub subtitle: String,
    /// Placeholder shown in the empty input line.
    pub input_hint: String,
    /// Name shown next to bot messages.
    pub bot_name: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            title: "Chat Assistant".to_string(),
            subtitle: String::new(),
            input_hint: "Type your message...".to_string(),
            bot_name: "Bot".to_string(),
        }
    }
}

/// Identity provider settings. Sign-in is unavailable when either is missing.
#[derive(Debug, Clone, Default)]
pub struct IdentityConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

impl IdentityConfig {
    /// URL and key, if both are present and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let url = self.url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let key = self
            .anon_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some((url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_needs_both_values() {
        let mut config = IdentityConfig {
            url: Some("https://project.supabase.co".into()),
            anon_key: None,
        };
        assert!(config.credentials().is_none());

        config.anon_key = Some("  ".into());
        assert!(config.credentials().is_none());

        config.anon_key = Some("anon".into());
        assert_eq!(
            config.credentials(),
            Some(("https://project.supabase.co", "anon"))
        );
    }
}
