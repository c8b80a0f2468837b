//! The active todo list

use tracing::{debug, error};

use super::filter::{apply_filters, Filters};
use super::types::{Todo, TodoForm};
use super::{Confirm, LoadState, DELETE_PROMPT};
use crate::api::TodoApi;
use crate::error::{Error, Result};
use crate::validation::validate_todo;

const LOAD_FAILED: &str = "Failed to load todos. Please try again.";
const CREATE_FAILED: &str = "Failed to create todo. Please try again.";
const UPDATE_FAILED: &str = "Failed to update todo. Please try again.";
const PIN_FAILED: &str = "Failed to pin todo. Please try again.";
const DELETE_FAILED: &str = "Failed to delete todo. Please try again.";

/// Working set of the active list plus its filtered view.
///
/// Local state only changes after the server confirms an operation. The
/// visible list is recomputed after every change and every filter toggle.
pub struct TodoList {
    api: TodoApi,
    todos: Vec<Todo>,
    visible: Vec<Todo>,
    filters: Filters,
    state: LoadState,
    loading: bool,
    error: Option<String>,
}

impl TodoList {
    pub fn new(api: TodoApi) -> Self {
        Self {
            api,
            todos: Vec::new(),
            visible: Vec::new(),
            filters: Filters::default(),
            state: LoadState::Idle,
            loading: false,
            error: None,
        }
    }

    /// Every item in the working set, unfiltered
    pub fn all(&self) -> &[Todo] {
        &self.todos
    }

    /// The filtered, sorted view
    pub fn visible(&self) -> &[Todo] {
        &self.visible
    }

    pub fn filters(&self) -> Filters {
        self.filters
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed operation
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn find(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.has_id(id))
    }

    fn refresh(&mut self) {
        self.visible = apply_filters(&self.todos, self.filters);
    }

    fn fail(&mut self, message: &str, err: &Error) {
        error!(error = %err, "{}", message);
        self.error = Some(message.to_string());
    }

    /// Replace the local item with the same id, if present
    fn replace(&mut self, updated: Todo, requested_id: &str) {
        let id = updated.id.clone().unwrap_or_else(|| requested_id.to_string());
        if let Some(slot) = self.todos.iter_mut().find(|t| t.has_id(&id)) {
            *slot = updated;
            self.refresh();
        }
    }

    /// Replace the working set with the server's active items
    pub async fn load(&mut self) -> Result<()> {
        self.state = LoadState::Loading;
        self.loading = true;
        self.error = None;

        let result = self.api.list().await;
        self.loading = false;

        match result {
            Ok(todos) => {
                debug!(count = todos.len(), "loaded todos");
                self.todos = todos;
                self.refresh();
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

    /// Create an item from the form. It is added at the front once the
    /// server has confirmed it.
    pub async fn create(&mut self, form: &TodoForm) -> Result<Todo> {
        if let Err(err) = validate_todo(form) {
            self.error = Some(err.message().to_string());
            return Err(err.into());
        }

        self.loading = true;
        self.error = None;

        let result = self.api.create(&form.to_create_request()).await;
        self.loading = false;

        match result {
            Ok(todo) => {
                self.todos.insert(0, todo.clone());
                self.refresh();
                Ok(todo)
            }
            Err(err) => {
                self.fail(CREATE_FAILED, &err);
                Err(err)
            }
        }
    }

    /// Save the edited title, description, priority and due date of an item
    pub async fn update(&mut self, id: &str, form: &TodoForm) -> Result<Todo> {
        if let Err(err) = validate_todo(form) {
            self.error = Some(err.message().to_string());
            return Err(err.into());
        }

        self.loading = true;
        self.error = None;

        let result = self.api.update(id, &form.to_update_request()).await;
        self.loading = false;

        match result {
            Ok(todo) => {
                self.replace(todo.clone(), id);
                Ok(todo)
            }
            Err(err) => {
                self.fail(UPDATE_FAILED, &err);
                Err(err)
            }
        }
    }

    /// Flip the completed flag. `Ok(None)` if the id is not in the list.
    pub async fn toggle_complete(&mut self, id: &str) -> Result<Option<Todo>> {
        let Some(completed) = self.find(id).map(|t| t.completed) else {
            return Ok(None);
        };

        match self.api.set_completed(id, !completed).await {
            Ok(todo) => {
                self.replace(todo.clone(), id);
                Ok(Some(todo))
            }
            Err(err) => {
                self.fail(UPDATE_FAILED, &err);
                Err(err)
            }
        }
    }

    /// Flip the pinned flag. `Ok(None)` if the id is not in the list.
    pub async fn toggle_pin(&mut self, id: &str) -> Result<Option<Todo>> {
        let Some(pinned) = self.find(id).map(|t| t.pinned) else {
            return Ok(None);
        };

        match self.api.set_pinned(id, !pinned).await {
            Ok(todo) => {
                self.replace(todo.clone(), id);
                Ok(Some(todo))
            }
            Err(err) => {
                self.fail(PIN_FAILED, &err);
                Err(err)
            }
        }
    }

    /// Move an item to the trash after confirmation, then reload the list.
    ///
    /// Returns `Ok(false)` when the user declined.
    pub async fn soft_delete(&mut self, id: &str, confirm: impl Confirm) -> Result<bool> {
        if !confirm.confirm(DELETE_PROMPT) {
            return Ok(false);
        }

        if let Err(err) = self.api.soft_delete(id).await {
            self.fail(DELETE_FAILED, &err);
            return Err(err);
        }

        self.load().await?;
        Ok(true)
    }

    pub fn toggle_show_completed(&mut self) {
        self.filters.show_completed_only = !self.filters.show_completed_only;
        self.refresh();
    }

    pub fn toggle_show_pinned_only(&mut self) {
        self.filters.show_pinned_only = !self.filters.show_pinned_only;
        self.refresh();
    }
}
