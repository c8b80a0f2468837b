//! Configuration for the todo client
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `SUPABASE_URL` | Yes | - |
//! | `SUPABASE_ANON_KEY` | Yes | - |
//! | `TODO_API_URL` | No | `http://localhost:8000/api` |
//! | `TODO_REQUEST_TIMEOUT_SECS` | No | 30 |
//! | `TODO_SESSION_PATH` | No | (in-memory session) |
//!
//! A `.env` file in the working directory is loaded first, if present.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Todo API base used when `TODO_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration options for the todo client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether to automatically refresh an expired access token
    pub auto_refresh_token: bool,

    /// Whether to keep the session after sign in
    pub persist_session: bool,

    /// File the session is persisted to between runs
    pub session_path: Option<PathBuf>,

    /// The request timeout, applied by the HTTP client
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            session_path: None,
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        }
    }
}

impl ClientOptions {
    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the file the session is persisted to
    pub fn with_session_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.session_path = Some(value.into());
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub(crate) fn auth_options(&self) -> supabase_todo_auth::AuthOptions {
        supabase_todo_auth::AuthOptions {
            auto_refresh_token: self.auto_refresh_token,
            persist_session: self.persist_session,
            storage_path: self.session_path.clone(),
        }
    }
}

/// Where the Supabase project and the todo API live
#[derive(Debug, Clone)]
pub struct TodoConfig {
    pub supabase_url: Url,
    pub anon_key: String,
    pub api_url: Url,
    pub options: ClientOptions,
}

impl TodoConfig {
    /// Creates a new configuration, validating both URLs.
    pub fn new(supabase_url: &str, anon_key: &str, api_url: &str) -> Result<Self> {
        let supabase_url = Url::parse(supabase_url)?;
        let api_url = Url::parse(api_url)?;
        if anon_key.is_empty() {
            return Err(Error::config("anon_key cannot be empty"));
        }
        Ok(Self {
            supabase_url,
            anon_key: anon_key.to_string(),
            api_url,
            options: ClientOptions::default(),
        })
    }

    /// Replace the client options
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Attempts to create configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let supabase_url = required_var("SUPABASE_URL")?;
        let anon_key = required_var("SUPABASE_ANON_KEY")?;
        let api_url = std::env::var("TODO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let mut options = ClientOptions::default();
        if let Ok(secs) = std::env::var("TODO_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::config(format!("TODO_REQUEST_TIMEOUT_SECS must be a number, got {secs:?}"))
            })?;
            options = options.with_request_timeout(Some(Duration::from_secs(secs)));
        }
        if let Ok(path) = std::env::var("TODO_SESSION_PATH") {
            options = options.with_session_path(path);
        }

        Ok(Self::new(&supabase_url, &anon_key, &api_url)?.with_options(options))
    }

    /// Todo API URL for a path such as `/todos/{id}`
    pub(crate) fn api_endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.as_str().trim_end_matches('/'), path)
    }

    /// Supabase project URL without a trailing slash
    pub(crate) fn supabase_base(&self) -> &str {
        self.supabase_url.as_str().trim_end_matches('/')
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::config(format!("{name} environment variable not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_key() {
        let err = TodoConfig::new("https://abc.supabase.co", "", DEFAULT_API_URL).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let err = TodoConfig::new("not a url", "key", DEFAULT_API_URL).unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }

    #[test]
    fn test_api_endpoint_joins_paths() {
        let config = TodoConfig::new("https://abc.supabase.co/", "key", "http://localhost:8000/api/")
            .unwrap();
        assert_eq!(
            config.api_endpoint("/todos/42/restore"),
            "http://localhost:8000/api/todos/42/restore"
        );
        assert_eq!(config.supabase_base(), "https://abc.supabase.co");
    }

    #[test]
    fn test_options_map_to_auth_options() {
        let options = ClientOptions::default()
            .with_auto_refresh_token(false)
            .with_session_path("/tmp/todo-session.json");
        let auth = options.auth_options();
        assert!(!auth.auto_refresh_token);
        assert!(auth.persist_session);
        assert_eq!(auth.storage_path, Some(PathBuf::from("/tmp/todo-session.json")));
    }
}
