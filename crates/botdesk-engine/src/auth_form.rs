//! Email then one-time-passcode sign-in form.
//!
//! The form is pure state: `submit` hands back an [`AuthRequest`] for the
//! caller to run against the identity store, and the outcome comes back
//! through `complete_request_otp` / `complete_verify_otp`.

use botdesk_core::{AuthResult, Session};
use tracing::debug;

/// Length of the emailed passcode.
pub const OTP_LENGTH: usize = 6;

/// Notice shown after a passcode has been sent.
pub const CODE_SENT_NOTICE: &str = "Code sent! Check your email.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStep {
    #[default]
    Email,
    Otp,
}

/// Identity operation requested by the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequest {
    RequestOtp { email: String },
    VerifyOtp { email: String, code: String },
}

/// Whether the form should stay open after a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Stay,
    Close,
}

#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    step: AuthStep,
    email: String,
    code: String,
    loading: bool,
    error: Option<String>,
    info: Option<String>,
}

impl AuthForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> AuthStep {
        self.step
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    /// Type a character into the active field.
    pub fn input_char(&mut self, c: char) {
        if self.loading || c.is_control() {
            return;
        }
        match self.step {
            AuthStep::Email => self.email.push(c),
            AuthStep::Otp => {
                if self.code.chars().count() < OTP_LENGTH && !c.is_whitespace() {
                    self.code.push(c);
                }
            }
        }
    }

    pub fn backspace(&mut self) {
        if self.loading {
            return;
        }
        match self.step {
            AuthStep::Email => self.email.pop(),
            AuthStep::Otp => self.code.pop(),
        };
    }

    /// Submit is disabled while a request runs or a required field is empty.
    pub fn can_submit(&self) -> bool {
        if self.loading || self.email.trim().is_empty() {
            return false;
        }
        match self.step {
            AuthStep::Email => true,
            AuthStep::Otp => !self.code.is_empty(),
        }
    }

    pub fn submit(&mut self) -> Option<AuthRequest> {
        if !self.can_submit() {
            return None;
        }
        self.loading = true;
        self.error = None;

        let email = self.email.trim().to_string();
        let request = match self.step {
            AuthStep::Email => {
                self.info = None;
                AuthRequest::RequestOtp { email }
            }
            AuthStep::Otp => AuthRequest::VerifyOtp {
                email,
                code: self.code.clone(),
            },
        };
        debug!(step = ?self.step, "Auth form submitted");
        Some(request)
    }

    pub fn complete_request_otp(&mut self, result: AuthResult<()>) {
        if !self.loading {
            return;
        }
        self.loading = false;
        match result {
            Ok(()) => {
                self.step = AuthStep::Otp;
                self.code.clear();
                self.info = Some(CODE_SENT_NOTICE.to_string());
            }
            Err(e) => self.error = Some(e.message),
        }
    }

    pub fn complete_verify_otp(&mut self, result: AuthResult<Session>) -> FormOutcome {
        if !self.loading {
            return FormOutcome::Stay;
        }
        self.loading = false;
        match result {
            Ok(_) => {
                self.reset();
                FormOutcome::Close
            }
            Err(e) => {
                self.error = Some(e.message);
                FormOutcome::Stay
            }
        }
    }

    /// Go back to the email step, keeping the email.
    pub fn back_to_email(&mut self) {
        if self.loading {
            return;
        }
        self.step = AuthStep::Email;
        self.code.clear();
        self.error = None;
        self.info = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botdesk_core::{AuthError, AuthErrorKind, User};

    fn type_str(form: &mut AuthForm, s: &str) {
        s.chars().for_each(|c| form.input_char(c));
    }

    fn at_otp_step() -> AuthForm {
        let mut form = AuthForm::new();
        type_str(&mut form, "ana@example.com");
        form.submit();
        form.complete_request_otp(Ok(()));
        form
    }

    #[test]
    fn test_submit_disabled_until_email_entered() {
        let mut form = AuthForm::new();
        assert!(!form.can_submit());
        assert!(form.submit().is_none());

        type_str(&mut form, "ana@example.com");
        assert_eq!(
            form.submit(),
            Some(AuthRequest::RequestOtp {
                email: "ana@example.com".into()
            })
        );
        assert!(form.is_loading());
        assert!(form.submit().is_none());
    }

    #[test]
    fn test_code_sent_moves_to_otp_step() {
        let form = at_otp_step();
        assert_eq!(form.step(), AuthStep::Otp);
        assert_eq!(form.info(), Some(CODE_SENT_NOTICE));
        assert!(!form.can_submit());
    }

    #[test]
    fn test_request_error_is_shown_verbatim() {
        let mut form = AuthForm::new();
        type_str(&mut form, "ana@example.com");
        form.submit();
        form.complete_request_otp(Err(AuthError::new(
            AuthErrorKind::Rejected,
            "Email rate limit exceeded",
        )));

        assert_eq!(form.step(), AuthStep::Email);
        assert_eq!(form.error(), Some("Email rate limit exceeded"));
        assert!(!form.is_loading());
    }

    #[test]
    fn test_code_is_capped_at_six_characters() {
        let mut form = at_otp_step();
        type_str(&mut form, "12345678");
        assert_eq!(form.code(), "123456");
        form.backspace();
        assert_eq!(form.code(), "12345");
    }

    #[test]
    fn test_verify_success_closes_and_resets() {
        let mut form = at_otp_step();
        type_str(&mut form, "123456");
        assert_eq!(
            form.submit(),
            Some(AuthRequest::VerifyOtp {
                email: "ana@example.com".into(),
                code: "123456".into()
            })
        );

        let session = Session {
            access_token: "t".into(),
            refresh_token: None,
            token_type: "bearer".into(),
            expires_in: None,
            user: User::new("u-1", "ana@example.com"),
        };
        assert_eq!(form.complete_verify_otp(Ok(session)), FormOutcome::Close);
        assert_eq!(form.step(), AuthStep::Email);
        assert_eq!(form.email(), "");
    }

    #[test]
    fn test_verify_failure_stays_on_otp_step() {
        let mut form = at_otp_step();
        type_str(&mut form, "000000");
        form.submit();

        let outcome = form.complete_verify_otp(Err(AuthError::new(
            AuthErrorKind::Rejected,
            "Token has expired or is invalid",
        )));

        assert_eq!(outcome, FormOutcome::Stay);
        assert_eq!(form.step(), AuthStep::Otp);
        assert_eq!(form.error(), Some("Token has expired or is invalid"));
    }

    #[test]
    fn test_back_keeps_email_and_clears_the_rest() {
        let mut form = at_otp_step();
        type_str(&mut form, "12");
        form.back_to_email();

        assert_eq!(form.step(), AuthStep::Email);
        assert_eq!(form.email(), "ana@example.com");
        assert_eq!(form.code(), "");
        assert!(form.info().is_none());
        assert!(form.error().is_none());
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut form = AuthForm::new();
        form.complete_request_otp(Ok(()));
        assert_eq!(form.step(), AuthStep::Email);
    }
}
