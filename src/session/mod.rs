//! Process-wide session state
//!
//! [`SessionStore`] owns the identity of the signed-in user and publishes it
//! to any number of subscribers. It starts out pending; [`SessionStore::initialize`]
//! restores an existing session from the provider and then follows the
//! provider's auth state changes.

mod provider;
mod types;

use std::sync::{Arc, Mutex, PoisonError};

use supabase_todo_auth::{AuthError, AuthStateChange};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use provider::SessionProvider;
pub use types::Identity;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    /// Nothing delivered yet
    Pending,
    /// Latest known identity, `None` when signed out
    Ready(Option<Identity>),
}

/// Holds the current identity and keeps it in step with the provider
pub struct SessionStore {
    provider: Arc<dyn SessionProvider>,
    state: Arc<watch::Sender<SessionState>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    /// Create a pending store. Call [`initialize`](Self::initialize) to load
    /// the existing session.
    pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::Pending);
        Self {
            provider,
            state: Arc::new(state),
            listener: Mutex::new(None),
        }
    }

    /// Restore any existing session and start following provider events.
    ///
    /// When the provider cannot be reached the store settles on "signed out".
    pub async fn initialize(&self) {
        // Subscribe first so a change racing the lookup is not lost
        let events = self.provider.subscribe();

        let identity = match self.provider.current_session().await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "could not restore existing session");
                None
            }
        };
        info!(signed_in = identity.is_some(), "session store initialized");
        publish(&self.state, identity);

        self.spawn_listener(events);
    }

    fn spawn_listener(&self, mut events: broadcast::Receiver<AuthStateChange>) {
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(change) => {
                        let identity = change.session.as_ref().map(|s| Identity::from(&s.user));
                        debug!(event = ?change.event, signed_in = identity.is_some(), "auth state change");
                        publish(&state, identity);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session listener fell behind provider events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let mut listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = listener.replace(handle) {
            previous.abort();
        }
    }

    /// Subscribe to identity changes. The latest known value is replayed first.
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.state.subscribe(),
            replayed: false,
        }
    }

    /// Latest known identity; `None` while pending or signed out
    pub fn current_identity(&self) -> Option<Identity> {
        match &*self.state.borrow() {
            SessionState::Ready(identity) => identity.clone(),
            SessionState::Pending => None,
        }
    }

    /// Whether a first value has been delivered
    pub fn is_initialized(&self) -> bool {
        *self.state.borrow() != SessionState::Pending
    }

    /// Wait for the first delivered value and return it, without keeping a
    /// subscription around.
    pub async fn first_identity(&self) -> Option<Identity> {
        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(|s| *s != SessionState::Pending).await {
            Ok(state) => state.clone(),
            Err(_) => return None,
        };
        match state {
            SessionState::Ready(identity) => identity,
            SessionState::Pending => None,
        }
    }

    /// A fresh access token for the todo API, `None` if there is none
    pub async fn access_token(&self) -> Option<String> {
        match self.provider.access_token().await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "could not obtain access token");
                None
            }
        }
    }

    /// Create an account. Publishes the identity when the provider signs the
    /// user in right away.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<Identity>, AuthError> {
        let identity = self.provider.sign_up(email, password, display_name).await?;
        if identity.is_some() {
            publish(&self.state, identity.clone());
        }
        Ok(identity)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.provider.sign_in(email, password).await?;
        publish(&self.state, Some(identity.clone()));
        Ok(identity)
    }

    /// Sign out. The identity is cleared whatever the provider answers.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let result = self.provider.sign_out().await;
        publish(&self.state, None);
        result
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        let listener = self.listener.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = listener.take() {
            handle.abort();
        }
    }
}

fn publish(state: &watch::Sender<SessionState>, identity: Option<Identity>) {
    let next = SessionState::Ready(identity);
    state.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

/// A replay-one view of the session identity
pub struct SessionSubscription {
    rx: watch::Receiver<SessionState>,
    replayed: bool,
}

impl SessionSubscription {
    /// Next identity value. The first call yields the latest known value
    /// at once if there is one. Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Option<Identity>> {
        if !self.replayed {
            self.replayed = true;
            if let SessionState::Ready(identity) = &*self.rx.borrow_and_update() {
                return Some(identity.clone());
            }
        }

        loop {
            self.rx.changed().await.ok()?;
            if let SessionState::Ready(identity) = &*self.rx.borrow_and_update() {
                return Some(identity.clone());
            }
        }
    }
}
