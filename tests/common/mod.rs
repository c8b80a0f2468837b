#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use supabase_todo::api::TodoApi;
use supabase_todo::config::TodoConfig;
use supabase_todo::session::{Identity, SessionProvider, SessionStore};
use supabase_todo_auth::{AuthChangeEvent, AuthError, AuthStateChange, Session};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use wiremock::MockServer;

pub const TOKEN: &str = "test-access-token";
pub const PASSWORD: &str = "password123";

/// Route library logs to the test output, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn identity(id: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        display_name: None,
    }
}

pub fn session_for(id: &str) -> Session {
    serde_json::from_value(json!({
        "access_token": TOKEN,
        "refresh_token": "refresh",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": { "id": id, "email": format!("{id}@example.com") }
    }))
    .unwrap()
}

/// In-memory stand-in for the Supabase auth client
pub struct FakeProvider {
    identity: Mutex<Option<Identity>>,
    restore_fails: bool,
    sign_out_fails: bool,
    events: broadcast::Sender<AuthStateChange>,
    pub calls: AtomicUsize,
}

impl FakeProvider {
    pub fn signed_out() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            identity: Mutex::new(None),
            restore_fails: false,
            sign_out_fails: false,
            events,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn signed_in(id: &str) -> Self {
        let provider = Self::signed_out();
        *provider.identity.lock().unwrap() = Some(identity(id));
        provider
    }

    pub fn failing_restore(mut self) -> Self {
        self.restore_fails = true;
        self
    }

    pub fn failing_sign_out(mut self) -> Self {
        self.sign_out_fails = true;
        self
    }

    /// Publish an auth state change as the real provider would
    pub fn emit(&self, event: AuthChangeEvent, user_id: Option<&str>) {
        *self.identity.lock().unwrap() = user_id.map(identity);
        let _ = self.events.send(AuthStateChange {
            event,
            session: user_id.map(session_for),
        });
    }

    fn call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn rejected(message: &str) -> AuthError {
    AuthError::ApiError {
        status: 400,
        message: message.to_string(),
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _display_name: &str,
    ) -> Result<Option<Identity>, AuthError> {
        self.call();
        if email.starts_with("taken") {
            return Err(rejected("User already registered"));
        }
        Ok(None)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.call();
        if password != PASSWORD {
            return Err(rejected("Invalid login credentials"));
        }
        let id = email.split('@').next().unwrap_or_default();
        let signed_in = identity(id);
        *self.identity.lock().unwrap() = Some(signed_in.clone());
        Ok(signed_in)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.call();
        *self.identity.lock().unwrap() = None;
        if self.sign_out_fails {
            return Err(rejected("logout failed"));
        }
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Identity>, AuthError> {
        self.call();
        if self.restore_fails {
            return Err(AuthError::MissingSession);
        }
        Ok(self.identity.lock().unwrap().clone())
    }

    async fn access_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self
            .identity
            .lock()
            .unwrap()
            .as_ref()
            .map(|_| TOKEN.to_string()))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }
}

pub async fn initialized_store(provider: Arc<FakeProvider>) -> Arc<SessionStore> {
    init_tracing();
    let store = Arc::new(SessionStore::new(provider));
    store.initialize().await;
    store
}

/// A todo API client pointed at `server`, signed in as `user_id` if given
pub async fn api_for(server: &MockServer, user_id: Option<&str>) -> TodoApi {
    let provider = match user_id {
        Some(id) => FakeProvider::signed_in(id),
        None => FakeProvider::signed_out(),
    };
    let store = initialized_store(Arc::new(provider)).await;
    let config = TodoConfig::new(
        "http://localhost:54321",
        "anon-key",
        &format!("{}/api", server.uri()),
    )
    .unwrap();
    TodoApi::new(Arc::new(config), Client::new(), store)
}

pub fn todo_json(
    id: &str,
    title: &str,
    completed: bool,
    pinned: bool,
    created_at: &str,
) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": "alice",
        "title": title,
        "description": null,
        "completed": completed,
        "pinned": pinned,
        "priority": "medium",
        "due_date": null,
        "created_at": created_at,
        "updated_at": created_at,
        "deleted_at": null
    })
}

pub fn trashed_json(id: &str, title: &str, deleted_at: &str) -> serde_json::Value {
    let mut todo = todo_json(id, title, false, false, "2024-05-01T09:00:00Z");
    todo["deleted_at"] = json!(deleted_at);
    todo
}
