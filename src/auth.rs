//! Login, signup and logout flows

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::guard::{LOGIN_PATH, TODOS_PATH};
use crate::session::{Identity, SessionStore};
use crate::validation::{validate_login, validate_signup, LoginForm, SignupForm};

/// Shown for any failed sign in, so the message says nothing about whether
/// the account exists
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub const SIGNUP_FAILED: &str = "Signup failed. Please try again.";

pub const SIGNUP_SUCCEEDED: &str =
    "Account created successfully! Please check your email to confirm.";

/// State behind the login and signup views
pub struct AuthFlow {
    session: Arc<SessionStore>,
    loading: bool,
    error_message: Option<String>,
    success_message: Option<String>,
}

impl AuthFlow {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self {
            session,
            loading: false,
            error_message: None,
            success_message: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success_message.as_deref()
    }

    /// The signed-in user, if any
    pub fn current_user(&self) -> Option<Identity> {
        self.session.current_identity()
    }

    /// Sign in and return the path to navigate to: `return_url` when the
    /// guard sent the user here, else the todo list.
    pub async fn login(&mut self, form: &LoginForm, return_url: Option<&str>) -> Result<String> {
        self.error_message = None;
        if let Err(err) = validate_login(form) {
            self.error_message = Some(err.message().to_string());
            return Err(err.into());
        }

        self.loading = true;
        let result = self.session.sign_in(&form.email, &form.password).await;
        self.loading = false;

        match result {
            Ok(identity) => {
                info!(user_id = %identity.id, "logged in");
                Ok(return_url.unwrap_or(TODOS_PATH).to_string())
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                self.error_message = Some(INVALID_CREDENTIALS.to_string());
                Err(Error::Auth(err))
            }
        }
    }

    /// Create an account and return the path to navigate to next.
    ///
    /// The form is cleared on success.
    pub async fn signup(&mut self, form: &mut SignupForm) -> Result<String> {
        self.error_message = None;
        if let Err(err) = validate_signup(form) {
            self.error_message = Some(err.message().to_string());
            return Err(err.into());
        }

        self.loading = true;
        self.success_message = None;
        let result = self
            .session
            .sign_up(&form.email, &form.password, &form.name)
            .await;
        self.loading = false;

        match result {
            Ok(_) => {
                info!("account created");
                self.success_message = Some(SIGNUP_SUCCEEDED.to_string());
                *form = SignupForm::default();
                Ok(LOGIN_PATH.to_string())
            }
            Err(err) => {
                warn!(error = %err, "signup failed");
                self.error_message = Some(SIGNUP_FAILED.to_string());
                Err(Error::Auth(err))
            }
        }
    }

    /// Sign out and return the login path. The local identity is cleared
    /// even when the provider call fails.
    pub async fn logout(&mut self) -> String {
        if let Err(err) = self.session.sign_out().await {
            error!(error = %err, "error logging out");
        }
        LOGIN_PATH.to_string()
    }
}
