//! Todo working sets and their operations

mod filter;
mod list;
mod trash;
mod types;

pub use filter::{apply_filters, Filters};
pub use list::TodoList;
pub use trash::TrashList;
pub use types::*;

/// Asked before soft-deleting an item
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this todo?";

/// Asked before removing an item for good
pub const PERMANENT_DELETE_PROMPT: &str =
    "Are you sure you want to permanently delete this todo? This action cannot be undone.";

/// Where a list is in its load cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Never loaded
    #[default]
    Idle,
    /// A load is in flight
    Loading,
    /// The last load succeeded
    Loaded,
    /// The last load failed; the previous items are kept
    Error,
}

/// A yes/no gate in front of destructive operations
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl Confirm for bool {
    fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}
