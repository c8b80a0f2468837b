//! The trash view

use tracing::{debug, error};

use super::types::Todo;
use super::{Confirm, LoadState, PERMANENT_DELETE_PROMPT};
use crate::api::TodoApi;
use crate::error::{Error, Result};

const LOAD_FAILED: &str = "Failed to load deleted todos. Please try again.";
const RESTORE_FAILED: &str = "Failed to restore todo. Please try again.";
const PERMANENT_DELETE_FAILED: &str = "Failed to delete todo permanently. Please try again.";

/// Soft-deleted items of the current user
pub struct TrashList {
    api: TodoApi,
    todos: Vec<Todo>,
    state: LoadState,
    loading: bool,
    error: Option<String>,
}

impl TrashList {
    pub fn new(api: TodoApi) -> Self {
        Self {
            api,
            todos: Vec::new(),
            state: LoadState::Idle,
            loading: false,
            error: None,
        }
    }

    pub fn items(&self) -> &[Todo] {
        &self.todos
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn fail(&mut self, message: &str, err: &Error) {
        error!(error = %err, "{}", message);
        self.error = Some(message.to_string());
    }

    fn remove(&mut self, id: &str) {
        self.todos.retain(|t| !t.has_id(id));
    }

    pub async fn load(&mut self) -> Result<()> {
        self.state = LoadState::Loading;
        self.loading = true;
        self.error = None;

        let result = self.api.list_trash().await;
        self.loading = false;

        match result {
            Ok(todos) => {
                debug!(count = todos.len(), "loaded trash");
                self.todos = todos;
                self.state = LoadState::Loaded;
                Ok(())
            }
            Err(err) => {
                self.fail(LOAD_FAILED, &err);
                self.state = LoadState::Error;
                Err(err)
            }
        }
    }

    /// Put an item back into the active list
    pub async fn restore(&mut self, id: &str) -> Result<Todo> {
        self.loading = true;
        self.error = None;

        let result = self.api.restore(id).await;
        self.loading = false;

        match result {
            Ok(todo) => {
                self.remove(id);
                Ok(todo)
            }
            Err(err) => {
                self.fail(RESTORE_FAILED, &err);
                Err(err)
            }
        }
    }

    /// Delete an item for good after confirmation.
    ///
    /// Returns `Ok(false)` when the user declined. There is no way back.
    pub async fn permanent_delete(&mut self, id: &str, confirm: impl Confirm) -> Result<bool> {
        if !confirm.confirm(PERMANENT_DELETE_PROMPT) {
            return Ok(false);
        }

        self.loading = true;
        self.error = None;

        let result = self.api.permanent_delete(id).await;
        self.loading = false;

        match result {
            Ok(()) => {
                self.remove(id);
                Ok(true)
            }
            Err(err) => {
                self.fail(PERMANENT_DELETE_FAILED, &err);
                Err(err)
            }
        }
    }
}
