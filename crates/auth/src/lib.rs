//! Supabase Auth client for Rust
//!
//! This crate provides the authentication side of the todo client:
//! sign up, sign in, sign out, session management and a stream of
//! auth state changes that other components can subscribe to.

mod session;
mod storage;

use log::{debug, info, warn};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;

pub use session::{token_expiry, Session, EXPIRY_MARGIN_SECS};
pub use storage::SessionStorage;

/// Capacity of the auth state change channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// エラー型
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing session")]
    MissingSession,

    #[error("Session storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl AuthError {
    /// HTTP status of the failed call, when the provider answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::NetworkError(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// ユーザー情報
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub app_metadata: serde_json::Value,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl User {
    /// The `name` stored in user metadata at sign up
    pub fn display_name(&self) -> Option<String> {
        self.user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Result of a sign up call.
///
/// With email confirmation enabled the project returns only the user; the
/// session is `None` until the address is confirmed and the user signs in.
#[derive(Debug, Clone)]
pub struct SignUpResponse {
    pub user: User,
    pub session: Option<Session>,
}

/// Kind of auth state change published by [`Auth::on_auth_state_change`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// An auth state change together with the session after the change
#[derive(Debug, Clone)]
pub struct AuthStateChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

/// クライアントオプション
#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub auto_refresh_token: bool,
    pub persist_session: bool,
    /// Where to persist the session between runs. In-memory only when `None`.
    pub storage_path: Option<PathBuf>,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            storage_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Auth クライアント
pub struct Auth {
    url: String,
    key: String,
    http_client: Client,
    options: AuthOptions,
    current_session: Arc<RwLock<Option<Session>>>,
    storage: Option<SessionStorage>,
    events: broadcast::Sender<AuthStateChange>,
}

impl Auth {
    /// 新しい Auth クライアントを作成
    pub fn new(url: &str, key: &str, http_client: Client, options: AuthOptions) -> Self {
        let storage = match (&options.storage_path, options.persist_session) {
            (Some(path), true) => Some(SessionStorage::new(path.clone())),
            _ => None,
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
            storage,
            events,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// Subscribe to sign in, sign out and token refresh events.
    ///
    /// Only changes that happen after the call are delivered.
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }

    /// ユーザー登録
    ///
    /// `display_name` is stored as `name` in the user's metadata.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SignUpResponse, AuthError> {
        let url = self.auth_url("/signup");

        let mut payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        if let Some(name) = display_name {
            payload["data"] = serde_json::json!({ "name": name });
        }

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let body: serde_json::Value = Self::parse_response(response).await?;

        if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)?;
            let session = session.with_expiry();
            self.store_session(session.clone(), AuthChangeEvent::SignedIn);
            return Ok(SignUpResponse {
                user: session.user.clone(),
                session: Some(session),
            });
        }

        let user: User = serde_json::from_value(body)?;
        info!("Signed up user {} (confirmation pending)", user.id);
        Ok(SignUpResponse {
            user,
            session: None,
        })
    }

    /// メール・パスワードでログイン
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = self.auth_url("/token?grant_type=password");

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let session: Session = Self::parse_response(response).await?;
        let session = session.with_expiry();

        // セッションを保存
        self.store_session(session.clone(), AuthChangeEvent::SignedIn);
        info!("Signed in user {}", session.user.id);

        Ok(session)
    }

    /// 現在のセッションを取得
    ///
    /// Falls back to the persisted session when nothing is held in memory,
    /// and refreshes an expired session when `auto_refresh_token` is set.
    pub async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let mut session = self.session_in_memory();

        if session.is_none() {
            if let Some(storage) = &self.storage {
                session = storage.load()?;
                if let Some(restored) = &session {
                    debug!("Restored persisted session for user {}", restored.user.id);
                    self.write_session(Some(restored.clone()));
                }
            }
        }

        match session {
            Some(s) if s.is_expired() && self.options.auto_refresh_token => {
                match self.refresh_session().await {
                    Ok(refreshed) => Ok(Some(refreshed)),
                    Err(err) => {
                        warn!("Failed to refresh expired session: {}", err);
                        self.clear_session();
                        Err(err)
                    }
                }
            }
            other => Ok(other),
        }
    }

    /// Current access token, refreshing the session first if it expired
    pub async fn get_access_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.get_session().await?.map(|s| s.access_token))
    }

    /// 現在のユーザーを取得
    pub async fn get_user(&self) -> Result<User, AuthError> {
        let session = self.session_in_memory().ok_or(AuthError::MissingSession)?;

        let url = self.auth_url("/user");

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// セッションをリフレッシュ
    pub async fn refresh_session(&self) -> Result<Session, AuthError> {
        let session = self.session_in_memory().ok_or(AuthError::MissingSession)?;

        let url = self.auth_url("/token?grant_type=refresh_token");

        let payload = serde_json::json!({
            "refresh_token": session.refresh_token,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let new_session: Session = Self::parse_response(response).await?;
        let new_session = new_session.with_expiry();

        // セッションを更新
        self.store_session(new_session.clone(), AuthChangeEvent::TokenRefreshed);
        debug!("Refreshed session for user {}", new_session.user.id);

        Ok(new_session)
    }

    /// Install a session obtained elsewhere, e.g. from an earlier run
    pub fn set_session(&self, session: Session) {
        self.store_session(session.with_expiry(), AuthChangeEvent::SignedIn);
    }

    /// サインアウト
    ///
    /// The local session is cleared even when the logout call fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.session_in_memory().map(|s| s.access_token);

        let result = match token {
            Some(token) => self.logout(&token).await,
            None => Ok(()),
        };

        self.clear_session();
        info!("Signed out");

        result
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let url = self.auth_url("/logout");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(())
    }

    fn session_in_memory(&self) -> Option<Session> {
        let read_guard = self
            .current_session
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        read_guard.clone()
    }

    fn write_session(&self, session: Option<Session>) {
        let mut write_guard = self
            .current_session
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *write_guard = session;
    }

    /// Keep the session in memory and announce it. A failure to persist it
    /// only costs the session on the next start.
    fn store_session(&self, session: Session, event: AuthChangeEvent) {
        self.write_session(Some(session.clone()));
        if self.options.persist_session {
            if let Some(storage) = &self.storage {
                if let Err(err) = storage.save(&session) {
                    warn!("Failed to persist session: {}", err);
                }
            }
        }
        self.publish(event, Some(session));
    }

    fn clear_session(&self) {
        self.write_session(None);
        if let Some(storage) = &self.storage {
            if let Err(err) = storage.clear() {
                warn!("Failed to remove persisted session: {}", err);
            }
        }
        self.publish(AuthChangeEvent::SignedOut, None);
    }

    fn publish(&self, event: AuthChangeEvent, session: Option<Session>) {
        // No receivers is not an error
        let _ = self.events.send(AuthStateChange { event, session });
    }

    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response.json::<T>().await?)
    }

    async fn api_error(response: Response) -> AuthError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        AuthError::ApiError {
            status: status.as_u16(),
            message: error_message(status, &text),
        }
    }
}

fn error_message(status: StatusCode, text: &str) -> String {
    if let Ok(body) = serde_json::from_str::<ErrorBody>(text) {
        if let Some(message) = body
            .error_description
            .or(body.msg)
            .or(body.message)
            .or(body.error)
        {
            return message;
        }
    }
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_body(token: &str) -> serde_json::Value {
        serde_json::json!({
            "access_token": token,
            "refresh_token": "test_refresh_token",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {
                "id": "test_user_id",
                "email": "test@example.com",
                "app_metadata": {},
                "user_metadata": { "name": "Test User" },
                "created_at": "2021-01-01T00:00:00Z",
                "updated_at": "2021-01-01T00:00:00Z"
            }
        })
    }

    #[test]
    fn test_sign_up_with_metadata() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/auth/v1/signup"))
                .and(header("apikey", "test_key"))
                .and(body_partial_json(serde_json::json!({
                    "email": "test@example.com",
                    "data": { "name": "Test User" }
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(session_body("signup_token")))
                .mount(&mock_server)
                .await;

            let auth = Auth::new(
                &mock_server.uri(),
                "test_key",
                Client::new(),
                AuthOptions::default(),
            );
            let mut events = auth.on_auth_state_change();

            let response = auth
                .sign_up("test@example.com", "password123", Some("Test User"))
                .await
                .unwrap();

            let session = response.session.unwrap();
            assert_eq!(session.access_token, "signup_token");
            assert_eq!(response.user.display_name(), Some("Test User".to_string()));

            let change = events.recv().await.unwrap();
            assert_eq!(change.event, AuthChangeEvent::SignedIn);
        });
    }

    #[test]
    fn test_sign_up_pending_confirmation() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/auth/v1/signup"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": "new_user",
                    "email": "new@example.com",
                    "user_metadata": { "name": "New" }
                })))
                .mount(&mock_server)
                .await;

            let auth = Auth::new(
                &mock_server.uri(),
                "test_key",
                Client::new(),
                AuthOptions::default(),
            );

            let response = auth
                .sign_up("new@example.com", "password123", Some("New"))
                .await
                .unwrap();

            assert!(response.session.is_none());
            assert_eq!(response.user.id, "new_user");
            assert!(auth.get_session().await.unwrap().is_none());
        });
    }

    #[test]
    fn test_sign_in_failure_carries_status() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/auth/v1/token"))
                .and(query_param("grant_type", "password"))
                .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                    "error": "invalid_grant",
                    "error_description": "Invalid login credentials"
                })))
                .mount(&mock_server)
                .await;

            let auth = Auth::new(
                &mock_server.uri(),
                "test_key",
                Client::new(),
                AuthOptions::default(),
            );

            let err = auth
                .sign_in_with_password("test@example.com", "wrong")
                .await
                .unwrap_err();

            assert_eq!(err.status(), Some(400));
            assert!(err.to_string().contains("Invalid login credentials"));
            assert!(auth.get_session().await.unwrap().is_none());
        });
    }

    #[test]
    fn test_sign_out_clears_session_even_on_failure() {
        tokio_test::block_on(async {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/auth/v1/token"))
                .respond_with(ResponseTemplate::new(200).set_body_json(session_body("token_a")))
                .mount(&mock_server)
                .await;
            Mock::given(method("POST"))
                .and(path("/auth/v1/logout"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&mock_server)
                .await;

            let auth = Auth::new(
                &mock_server.uri(),
                "test_key",
                Client::new(),
                AuthOptions::default(),
            );
            auth.sign_in_with_password("test@example.com", "password123")
                .await
                .unwrap();

            let mut events = auth.on_auth_state_change();
            assert!(auth.sign_out().await.is_err());
            assert!(auth.get_session().await.unwrap().is_none());
            assert_eq!(events.recv().await.unwrap().event, AuthChangeEvent::SignedOut);
        });
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"msg":"weak password"}"#),
            "weak password"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }
}
