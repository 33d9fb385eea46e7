//! Task domain model.
//!
//! # Responsibility
//! - Define the task record, its pipeline state and the edit patch shape.
//!
//! # Invariants
//! - `state` always names the board column that holds the task.
//! - `assignee_id` is a weak reference; it may name a user that no longer exists.

use crate::model::user::{short_suffix, UserId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque stable identifier of a task, e.g. `t-1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an externally known identifier (persisted or imported data).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Draws a fresh random identifier with the `t-` prefix.
    pub fn generate() -> Self {
        Self(format!("t-{}", short_suffix()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pipeline stage of a task, in board column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    New,
    InProgress,
    Blocked,
    Resolved,
    Done,
}

impl TaskState {
    /// All states in column order.
    pub const ALL: [TaskState; 5] = [
        Self::New,
        Self::InProgress,
        Self::Blocked,
        Self::Resolved,
        Self::Done,
    ];

    /// Stable wire id, also the persisted column key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "inprogress",
            Self::Blocked => "blocked",
            Self::Resolved => "resolved",
            Self::Done => "done",
        }
    }

    /// Column heading shown by board views.
    pub fn title(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InProgress => "In Progress",
            Self::Blocked => "Blocked",
            Self::Resolved => "Resolved",
            Self::Done => "Done",
        }
    }
}

impl Display for TaskState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task record in persisted wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// `null` on the wire when unassigned.
    pub assignee_id: Option<UserId>,
    pub state: TaskState,
    pub description: String,
}

impl Task {
    /// Creates a task in `new` with a generated id.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        assignee_id: Option<UserId>,
    ) -> Self {
        Self {
            id: TaskId::generate(),
            title: title.into(),
            assignee_id,
            state: TaskState::New,
            description: description.into(),
        }
    }

    pub fn is_assigned_to(&self, user_id: &UserId) -> bool {
        self.assignee_id.as_ref() == Some(user_id)
    }

    pub fn is_unassigned(&self) -> bool {
        self.assignee_id.is_none()
    }
}

/// Partial edit of a task. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the assignee; `None` keeps it.
    pub assignee_id: Option<Option<UserId>>,
    pub state: Option<TaskState>,
}

impl TaskPatch {
    /// Patch that only changes the state.
    pub fn state(state: TaskState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_assignee(mut self, assignee_id: Option<UserId>) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    pub fn with_state(mut self, state: TaskState) -> Self {
        self.state = Some(state);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::TaskId;

    #[test]
    fn generated_task_ids_carry_prefix() {
        assert!(TaskId::generate().as_str().starts_with("t-"));
    }
}
