//! Board aggregate.
//!
//! # Responsibility
//! - Own the user registry and the per-state task columns of one session.
//! - Provide structural mutations (insert, relocate, remove) for the service layer.
//! - Reject structurally invalid snapshots on load.
//!
//! # Invariants
//! - A task lives in exactly one column, and that column matches `task.state`.
//! - User ids and task ids are unique within their collections.
//! - User names and emails are non-blank and unique after trim + lowercase.
//! - Task titles and descriptions are non-blank.
//! - At least one admin exists.
//! - `current_user_id`, when set, names an existing user.

use crate::model::snapshot::BoardSnapshot;
use crate::model::task::{Task, TaskId, TaskState};
use crate::model::user::{normalize_key, User, UserId};
use crate::policy::ensure_admin_remains;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Standing board invariant that an operation or snapshot would break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The user set would contain no admin.
    LastAdmin,
    DuplicateUserId(UserId),
    DuplicateTaskId(TaskId),
    /// Carries the id of the later user whose name repeats an earlier one.
    DuplicateUserName(UserId),
    DuplicateUserEmail(UserId),
    BlankUserField {
        user_id: UserId,
        field: &'static str,
    },
    BlankTaskField {
        task_id: TaskId,
        field: &'static str,
    },
    /// A task is stored under a column that disagrees with its `state`.
    StateMismatch {
        task_id: TaskId,
        column: TaskState,
        state: TaskState,
    },
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastAdmin => write!(f, "board must keep at least one admin user"),
            Self::DuplicateUserId(id) => write!(f, "duplicate user id: {id}"),
            Self::DuplicateTaskId(id) => write!(f, "duplicate task id: {id}"),
            Self::DuplicateUserName(id) => write!(f, "user {id} repeats an existing name"),
            Self::DuplicateUserEmail(id) => write!(f, "user {id} repeats an existing email"),
            Self::BlankUserField { user_id, field } => {
                write!(f, "user {user_id} has a blank {field}")
            }
            Self::BlankTaskField { task_id, field } => {
                write!(f, "task {task_id} has a blank {field}")
            }
            Self::StateMismatch {
                task_id,
                column,
                state,
            } => write!(
                f,
                "task {task_id} has state `{state}` but is stored in column `{column}`"
            ),
        }
    }
}

impl Error for InvariantViolation {}

/// Ordered task sequences keyed by pipeline state, in persisted wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskColumns {
    #[serde(default)]
    pub new: Vec<Task>,
    #[serde(default)]
    pub inprogress: Vec<Task>,
    #[serde(default)]
    pub blocked: Vec<Task>,
    #[serde(default)]
    pub resolved: Vec<Task>,
    #[serde(default)]
    pub done: Vec<Task>,
}

impl TaskColumns {
    pub fn column(&self, state: TaskState) -> &[Task] {
        match state {
            TaskState::New => &self.new,
            TaskState::InProgress => &self.inprogress,
            TaskState::Blocked => &self.blocked,
            TaskState::Resolved => &self.resolved,
            TaskState::Done => &self.done,
        }
    }

    fn column_mut(&mut self, state: TaskState) -> &mut Vec<Task> {
        match state {
            TaskState::New => &mut self.new,
            TaskState::InProgress => &mut self.inprogress,
            TaskState::Blocked => &mut self.blocked,
            TaskState::Resolved => &mut self.resolved,
            TaskState::Done => &mut self.done,
        }
    }

    /// Iterates `(state, column)` pairs in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskState, &[Task])> + '_ {
        TaskState::ALL
            .into_iter()
            .map(move |state| (state, self.column(state)))
    }

    pub fn len(&self) -> usize {
        self.iter().map(|(_, tasks)| tasks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory aggregate root for one board session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    users: Vec<User>,
    columns: TaskColumns,
    current_user_id: Option<UserId>,
}

impl Board {
    /// Builds a board from persisted, supplied or imported data.
    ///
    /// A dangling `current_user_id` is cleared rather than rejected, and a
    /// blank `assignee_id` is read as unassigned.
    ///
    /// # Errors
    /// - `DuplicateUserId` / `DuplicateTaskId` when ids repeat.
    /// - `BlankUserField` / `DuplicateUserName` / `DuplicateUserEmail` when the
    ///   registry breaks the rules `create_user` enforces.
    /// - `BlankTaskField` when a title or description is blank.
    /// - `StateMismatch` when a task sits in a column other than its state.
    /// - `LastAdmin` when no admin user exists.
    pub fn from_snapshot(snapshot: BoardSnapshot) -> Result<Self, InvariantViolation> {
        let BoardSnapshot {
            users,
            mut tasks,
            current_user_id,
        } = snapshot;

        check_users(&users)?;
        ensure_admin_remains(users.iter())?;
        check_tasks(&tasks)?;

        for state in TaskState::ALL {
            for task in tasks.column_mut(state) {
                if task
                    .assignee_id
                    .as_ref()
                    .is_some_and(|id| id.as_str().trim().is_empty())
                {
                    task.assignee_id = None;
                }
            }
        }

        let current_user_id = match current_user_id {
            Some(id) if !users.iter().any(|user| user.id == id) => {
                warn!(
                    "event=board_load module=model status=degraded reason=dangling_current_user user_id={}",
                    id
                );
                None
            }
            other => other,
        };

        Ok(Self {
            users,
            columns: tasks,
            current_user_id,
        })
    }

    /// Returns the persisted layout of this board.
    pub fn to_snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            users: self.users.clone(),
            tasks: self.columns.clone(),
            current_user_id: self.current_user_id.clone(),
        }
    }

    /// Users in registry (insertion) order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|user| &user.id == id)
    }

    pub fn columns(&self) -> &TaskColumns {
        &self.columns
    }

    pub fn column(&self, state: TaskState) -> &[Task] {
        self.columns.column(state)
    }

    /// All tasks in pipeline order, column order preserved.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.columns.iter().flat_map(|(_, tasks)| tasks.iter())
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.locate_task(id)
            .map(|(state, index)| &self.columns.column(state)[index])
    }

    /// Returns the column and position that hold `id`.
    pub fn locate_task(&self, id: &TaskId) -> Option<(TaskState, usize)> {
        self.columns.iter().find_map(|(state, tasks)| {
            tasks
                .iter()
                .position(|task| &task.id == id)
                .map(|index| (state, index))
        })
    }

    pub fn current_user_id(&self) -> Option<&UserId> {
        self.current_user_id.as_ref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user_id.as_ref().and_then(|id| self.user(id))
    }

    /// Draws a user id not yet present on this board.
    pub fn fresh_user_id(&self) -> UserId {
        loop {
            let candidate = UserId::generate();
            if self.user(&candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Draws a task id not yet present on this board.
    pub fn fresh_task_id(&self) -> TaskId {
        loop {
            let candidate = TaskId::generate();
            if self.locate_task(&candidate).is_none() {
                return candidate;
            }
        }
    }

    pub(crate) fn set_current_user_id(&mut self, id: Option<UserId>) {
        self.current_user_id = id;
    }

    pub(crate) fn push_user(&mut self, user: User) {
        self.users.push(user);
    }

    /// Removes a user and clears the session pointer if it named that user.
    pub(crate) fn remove_user(&mut self, id: &UserId) -> Option<User> {
        let index = self.users.iter().position(|user| &user.id == id)?;
        if self.current_user_id.as_ref() == Some(id) {
            self.current_user_id = None;
        }
        Some(self.users.remove(index))
    }

    /// Appends a task to the end of the column named by its state.
    pub(crate) fn append_task(&mut self, task: Task) {
        self.columns.column_mut(task.state).push(task);
    }

    /// Inserts a task at the front of the column named by its state.
    pub(crate) fn prepend_task(&mut self, task: Task) {
        self.columns.column_mut(task.state).insert(0, task);
    }

    pub(crate) fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        let (state, index) = self.locate_task(id)?;
        self.columns.column_mut(state).get_mut(index)
    }

    pub(crate) fn remove_task(&mut self, id: &TaskId) -> Option<Task> {
        let (state, index) = self.locate_task(id)?;
        Some(self.columns.column_mut(state).remove(index))
    }
}

fn check_users(users: &[User]) -> Result<(), InvariantViolation> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    let mut emails = HashSet::new();
    for user in users {
        if !ids.insert(&user.id) {
            return Err(InvariantViolation::DuplicateUserId(user.id.clone()));
        }
        for (field, value) in [("name", &user.name), ("email", &user.email)] {
            if value.trim().is_empty() {
                return Err(InvariantViolation::BlankUserField {
                    user_id: user.id.clone(),
                    field,
                });
            }
        }
        if !names.insert(normalize_key(&user.name)) {
            return Err(InvariantViolation::DuplicateUserName(user.id.clone()));
        }
        if !emails.insert(normalize_key(&user.email)) {
            return Err(InvariantViolation::DuplicateUserEmail(user.id.clone()));
        }
    }
    Ok(())
}

fn check_tasks(tasks: &TaskColumns) -> Result<(), InvariantViolation> {
    let mut ids = HashSet::new();
    for (column, column_tasks) in tasks.iter() {
        for task in column_tasks {
            if task.state != column {
                return Err(InvariantViolation::StateMismatch {
                    task_id: task.id.clone(),
                    column,
                    state: task.state,
                });
            }
            if !ids.insert(&task.id) {
                return Err(InvariantViolation::DuplicateTaskId(task.id.clone()));
            }
            for (field, value) in [("title", &task.title), ("description", &task.description)] {
                if value.trim().is_empty() {
                    return Err(InvariantViolation::BlankTaskField {
                        task_id: task.id.clone(),
                        field,
                    });
                }
            }
        }
    }
    Ok(())
}
