//! Supabase Todo Client Library
//!
//! A todo-list client: users sign in through Supabase Auth, and their todos
//! live behind a separate REST API that accepts the Supabase access token.
//!
//! The pieces, leaf first:
//!
//! - [`session::SessionStore`]: current identity, replayed to subscribers
//! - [`api::TodoApi`]: todo API calls with a fresh bearer token each time
//! - [`todos::TodoList`] and [`todos::TrashList`]: local working sets
//! - [`validation`]: form checks run before anything is sent
//! - [`guard::RouteGuard`]: gate for views that need a signed-in user
//! - [`auth::AuthFlow`]: login, signup and logout

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod session;
pub mod todos;
pub mod validation;

use std::sync::Arc;

use reqwest::Client;
use supabase_todo_auth::Auth;

use crate::api::TodoApi;
use crate::auth::AuthFlow;
use crate::config::TodoConfig;
use crate::error::Result;
use crate::guard::RouteGuard;
use crate::session::SessionStore;
use crate::todos::{TodoList, TrashList};

/// The wired-up client
///
/// # Example
///
/// ```no_run
/// use supabase_todo::{config::TodoConfig, TodoApp};
///
/// # async fn run() -> supabase_todo::error::Result<()> {
/// let app = TodoApp::new(TodoConfig::from_env()?)?;
/// app.initialize().await;
///
/// let mut todos = app.todo_list();
/// todos.load().await?;
/// for todo in todos.visible() {
///     println!("{}", todo.title);
/// }
/// # Ok(())
/// # }
/// ```
pub struct TodoApp {
    config: Arc<TodoConfig>,
    auth: Arc<Auth>,
    session: Arc<SessionStore>,
    api: TodoApi,
}

impl TodoApp {
    /// Build the HTTP client, the Supabase auth client and the session store
    pub fn new(config: TodoConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let auth = Arc::new(Auth::new(
            config.supabase_base(),
            &config.anon_key,
            http_client.clone(),
            config.options.auth_options(),
        ));
        let session = Arc::new(SessionStore::new(auth.clone()));

        let config = Arc::new(config);
        let api = TodoApi::new(config.clone(), http_client, session.clone());

        Ok(Self {
            config,
            auth,
            session,
            api,
        })
    }

    /// Restore an existing session. Guarded navigation waits for this.
    pub async fn initialize(&self) {
        self.session.initialize().await;
    }

    pub fn config(&self) -> &TodoConfig {
        &self.config
    }

    /// The underlying Supabase auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn session(&self) -> Arc<SessionStore> {
        self.session.clone()
    }

    pub fn api(&self) -> TodoApi {
        self.api.clone()
    }

    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.clone())
    }

    pub fn auth_flow(&self) -> AuthFlow {
        AuthFlow::new(self.session.clone())
    }

    pub fn todo_list(&self) -> TodoList {
        TodoList::new(self.api.clone())
    }

    pub fn trash(&self) -> TrashList {
        TrashList::new(self.api.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::AuthFlow;
    pub use crate::config::{ClientOptions, TodoConfig};
    pub use crate::error::{Error, RequestError, ValidationError};
    pub use crate::guard::{GuardDecision, RouteGuard};
    pub use crate::session::{Identity, SessionStore};
    pub use crate::todos::{Filters, Priority, Todo, TodoForm, TodoList, TrashList};
    pub use crate::validation::{LoginForm, SignupForm};
    pub use crate::TodoApp;
}
