//! Client-side filtering and ordering of the active list

use super::types::Todo;

/// View toggles of the active list. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filters {
    /// Show only completed items
    pub show_completed_only: bool,
    /// Show only pinned items
    pub show_pinned_only: bool,
}

/// Derive the visible list from the full working set.
///
/// Deleted items are always dropped. Pinned items come first, and within each
/// group newer items come first; an item without `created_at` sorts as if it
/// were created at the Unix epoch. The sort is stable, so items that compare
/// equal keep their input order.
pub fn apply_filters(todos: &[Todo], filters: Filters) -> Vec<Todo> {
    let mut visible: Vec<Todo> = todos
        .iter()
        .filter(|todo| !todo.is_deleted())
        .filter(|todo| !filters.show_completed_only || todo.completed)
        .filter(|todo| !filters.show_pinned_only || todo.pinned)
        .cloned()
        .collect();

    visible.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| created_millis(b).cmp(&created_millis(a)))
    });

    visible
}

fn created_millis(todo: &Todo) -> i64 {
    todo.created_at.map(|t| t.timestamp_millis()).unwrap_or(0)
}
