//! Error handling for the todo client

use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

pub use supabase_todo_auth::AuthError;

/// Unified error type for the todo client
#[derive(Error, Debug)]
pub enum Error {
    /// Form input rejected before any request was made
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Sign in, sign up or session errors from the auth provider
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-2xx response from the todo API
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Whether the todo API rejected the call as unauthenticated.
    ///
    /// Callers should send the user back to the login view.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Error::Request(err) => err.is_unauthorized(),
            Error::Http(err) => err.status() == Some(StatusCode::UNAUTHORIZED),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A failed todo API call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Request failed with status {status}: {message}")]
pub struct RequestError {
    pub status: StatusCode,
    pub message: String,
}

impl RequestError {
    pub fn new<T: fmt::Display>(status: StatusCode, message: T) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }
}

/// Form input that failed a pre-submission check.
///
/// The message is shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new<T: fmt::Display>(message: T) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
