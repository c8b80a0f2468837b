//! Authenticated client for the todo REST API

use std::sync::Arc;

use reqwest::Client;

use crate::config::TodoConfig;
use crate::error::Result;
use crate::fetch::{Fetch, FetchBuilder};
use crate::session::SessionStore;
use crate::todos::{CreateTodoRequest, Todo, UpdateTodoRequest};

/// Issues todo API calls on behalf of the signed-in user.
///
/// Every call fetches a fresh access token from the session store. There is
/// no retry or queueing; one call is one request.
#[derive(Clone)]
pub struct TodoApi {
    config: Arc<TodoConfig>,
    http_client: Client,
    session: Arc<SessionStore>,
}

impl TodoApi {
    pub fn new(config: Arc<TodoConfig>, http_client: Client, session: Arc<SessionStore>) -> Self {
        Self {
            config,
            http_client,
            session,
        }
    }

    async fn authorized<'a>(&self, builder: FetchBuilder<'a>) -> FetchBuilder<'a> {
        let token = self.session.access_token().await;
        builder.bearer_auth(token.as_deref())
    }

    fn endpoint(&self, path: &str) -> String {
        self.config.api_endpoint(path)
    }

    /// Endpoint for one item. The id is percent-encoded so it stays a single
    /// path segment.
    fn item_endpoint(&self, id: &str, suffix: &str) -> String {
        self.endpoint(&format!("/todos/{}{}", urlencoding::encode(id), suffix))
    }

    /// `GET /todos`: active todos of the current user
    pub async fn list(&self) -> Result<Vec<Todo>> {
        let url = self.endpoint("/todos");
        self.authorized(Fetch::get(&self.http_client, &url))
            .await
            .execute()
            .await
    }

    /// `POST /todos`
    pub async fn create(&self, request: &CreateTodoRequest) -> Result<Todo> {
        let url = self.endpoint("/todos");
        self.authorized(Fetch::post(&self.http_client, &url))
            .await
            .json(request)?
            .execute()
            .await
    }

    /// `PATCH /todos/{id}` with only the fields set in `updates`
    pub async fn update(&self, id: &str, updates: &UpdateTodoRequest) -> Result<Todo> {
        let url = self.item_endpoint(id, "");
        self.authorized(Fetch::patch(&self.http_client, &url))
            .await
            .json(updates)?
            .execute()
            .await
    }

    pub async fn set_completed(&self, id: &str, completed: bool) -> Result<Todo> {
        self.update(id, &UpdateTodoRequest::completed(completed)).await
    }

    pub async fn set_pinned(&self, id: &str, pinned: bool) -> Result<Todo> {
        self.update(id, &UpdateTodoRequest::pinned(pinned)).await
    }

    /// `DELETE /todos/{id}`: moves the item to the trash
    pub async fn soft_delete(&self, id: &str) -> Result<()> {
        let url = self.item_endpoint(id, "");
        self.authorized(Fetch::delete(&self.http_client, &url))
            .await
            .execute_empty()
            .await
    }

    /// `GET /todos/trash`: soft-deleted todos
    pub async fn list_trash(&self) -> Result<Vec<Todo>> {
        let url = self.endpoint("/todos/trash");
        self.authorized(Fetch::get(&self.http_client, &url))
            .await
            .execute()
            .await
    }

    /// `POST /todos/{id}/restore`
    pub async fn restore(&self, id: &str) -> Result<Todo> {
        let url = self.item_endpoint(id, "/restore");
        self.authorized(Fetch::post(&self.http_client, &url))
            .await
            .json(&serde_json::json!({}))?
            .execute()
            .await
    }

    /// `DELETE /todos/{id}/permanent`: cannot be undone
    pub async fn permanent_delete(&self, id: &str) -> Result<()> {
        let url = self.item_endpoint(id, "/permanent");
        self.authorized(Fetch::delete(&self.http_client, &url))
            .await
            .execute_empty()
            .await
    }
}
