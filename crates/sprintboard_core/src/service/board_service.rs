//! Board use-case service.
//!
//! # Responsibility
//! - Provide every user/task mutation with its validation and permission rules.
//! - Provide the filtered views used by board, sidebar and unassigned listings.
//! - Persist the full snapshot after every accepted mutation.
//!
//! # Invariants
//! - Rejected operations leave the board untouched and write nothing.
//! - Persistence failures are logged and swallowed; memory stays authoritative.
//! - Requesters are identified by an explicit `Session`, never by ambient state.

use crate::model::board::Board;
use crate::model::snapshot::BoardSnapshot;
use crate::model::task::{Task, TaskId, TaskPatch, TaskState};
use crate::model::user::{Role, User, UserId};
use crate::policy::{
    allowed_transitions, can_edit_task, can_view_task, ensure_admin_remains,
    is_transition_allowed,
};
use crate::repo::board_store::BoardStore;
use crate::service::error::{
    BoardError, BoardResult, Field, FieldReason, GuardedAction, ValidationErrors,
};
use log::{debug, info, warn};
use serde_json::Value;

/// Label used for tasks without a resolvable assignee.
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Identity of the user issuing a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    user_id: UserId,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

/// One board column as seen by a particular user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView<'a> {
    pub state: TaskState,
    pub tasks: Vec<&'a Task>,
}

/// Board facade over an in-memory aggregate and a durable store.
pub struct BoardService<S: BoardStore> {
    board: Board,
    store: S,
}

impl<S: BoardStore> BoardService<S> {
    /// Wraps an already loaded board. Nothing is written until the first mutation.
    pub fn new(board: Board, store: S) -> Self {
        Self { board, store }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Session of the persisted current user, if one is recorded.
    pub fn current_session(&self) -> Option<Session> {
        self.board.current_user_id().cloned().map(Session::new)
    }

    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.board.user(id)
    }

    /// Looks up a task; its `state` names the column holding it.
    pub fn find_task(&self, id: &TaskId) -> Option<&Task> {
        self.board.task(id)
    }

    /// Registers a new member.
    ///
    /// # Contract
    /// - Name and email are trimmed; blank fields are reported together.
    /// - Duplicates are checked per field, trimmed and case-insensitively.
    /// - The new user is appended with role `member` and a fresh id.
    pub fn create_user(&mut self, name: &str, email: &str) -> BoardResult<User> {
        let result = self.create_user_inner(name, email);
        log_rejection("create_user", &result);
        result
    }

    fn create_user_inner(&mut self, name: &str, email: &str) -> BoardResult<User> {
        let name = name.trim();
        let email = email.trim();

        let mut errors = ValidationErrors::new();
        if name.is_empty() {
            errors.push(Field::Name, FieldReason::Required);
        } else if self.board.users().iter().any(|user| user.name_matches(name)) {
            errors.push(Field::Name, FieldReason::Duplicate);
        }
        if email.is_empty() {
            errors.push(Field::Email, FieldReason::Required);
        } else if self.board.users().iter().any(|user| user.email_matches(email)) {
            errors.push(Field::Email, FieldReason::Duplicate);
        }
        errors.into_result()?;

        let user = User {
            id: self.board.fresh_user_id(),
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Member,
        };
        self.board.push_user(user.clone());
        self.persist();
        info!(
            "event=user_create module=service status=ok user_id={} user_count={}",
            user.id,
            self.board.users().len()
        );
        Ok(user)
    }

    /// Removes a user. Tasks assigned to them keep the now dangling id.
    ///
    /// # Errors
    /// - `Permission` unless the requester is an admin.
    /// - `UserNotFound` when the target does not exist.
    /// - `Invariant(LastAdmin)` when no admin would remain.
    pub fn delete_user(&mut self, session: &Session, target: &UserId) -> BoardResult<()> {
        let result = self.delete_user_inner(session, target);
        log_rejection("delete_user", &result);
        result
    }

    fn delete_user_inner(&mut self, session: &Session, target: &UserId) -> BoardResult<()> {
        self.require_admin(session, GuardedAction::DeleteUser)?;
        if self.board.user(target).is_none() {
            return Err(BoardError::UserNotFound(target.clone()));
        }
        ensure_admin_remains(self.board.users().iter().filter(|user| &user.id != target))?;

        self.board.remove_user(target);
        self.persist();
        info!(
            "event=user_delete module=service status=ok user_id={} requester_id={}",
            target,
            session.user_id()
        );
        Ok(())
    }

    /// Finds the single user matching both name and email, trimmed and case-insensitively.
    pub fn authenticate(&self, name: &str, email: &str) -> BoardResult<User> {
        let found = self
            .board
            .users()
            .iter()
            .find(|user| user.name_matches(name) && user.email_matches(email))
            .cloned();
        match found {
            Some(user) => Ok(user),
            None => {
                info!("event=auth module=service status=rejected error_code=auth");
                Err(BoardError::Auth)
            }
        }
    }

    /// Authenticates and records the user as the board's current user.
    pub fn login(&mut self, name: &str, email: &str) -> BoardResult<Session> {
        let user = self.authenticate(name, email)?;
        self.board.set_current_user_id(Some(user.id.clone()));
        self.persist();
        info!("event=login module=service status=ok user_id={}", user.id);
        Ok(Session::new(user.id))
    }

    /// Makes `user_id` the board's current user.
    ///
    /// Admins may select anyone; members may only select themselves.
    pub fn select_user(&mut self, session: &Session, user_id: &UserId) -> BoardResult<()> {
        let result = self.select_user_inner(session, user_id);
        log_rejection("select_user", &result);
        result
    }

    fn select_user_inner(&mut self, session: &Session, user_id: &UserId) -> BoardResult<()> {
        let requester = self.requester(session, GuardedAction::SelectUser)?;
        if !requester.is_admin() && &requester.id != user_id {
            return Err(BoardError::Permission {
                action: GuardedAction::SelectUser,
            });
        }
        if self.board.user(user_id).is_none() {
            return Err(BoardError::UserNotFound(user_id.clone()));
        }

        self.board.set_current_user_id(Some(user_id.clone()));
        self.persist();
        debug!("event=user_select module=service status=ok user_id={user_id}");
        Ok(())
    }

    /// Sidebar listing: admins see everyone in registry order, members only themselves.
    pub fn visible_users<'a>(&'a self, viewer: &'a User) -> Vec<&'a User> {
        self.board
            .users()
            .iter()
            .filter(|user| viewer.is_admin() || user.id == viewer.id)
            .collect()
    }

    /// Resolves an assignee id to a display name.
    pub fn user_display_name(&self, assignee_id: Option<&UserId>) -> &str {
        assignee_id
            .and_then(|id| self.board.user(id))
            .map_or(UNASSIGNED_LABEL, |user| user.name.as_str())
    }

    /// Creates a task in `new`, appended to the end of that column.
    ///
    /// # Contract
    /// - Title and description are trimmed; blank fields are reported together.
    /// - A provided assignee must name an existing user.
    pub fn create_task(
        &mut self,
        title: &str,
        description: &str,
        assignee_id: Option<UserId>,
    ) -> BoardResult<Task> {
        let result = self.create_task_inner(title, description, assignee_id);
        log_rejection("create_task", &result);
        result
    }

    fn create_task_inner(
        &mut self,
        title: &str,
        description: &str,
        assignee_id: Option<UserId>,
    ) -> BoardResult<Task> {
        let mut errors = ValidationErrors::new();
        self.check_text_fields(Some(title), Some(description), &mut errors);
        self.check_assignee(assignee_id.as_ref(), &mut errors);
        errors.into_result()?;

        let task = Task {
            id: self.board.fresh_task_id(),
            title: title.trim().to_string(),
            assignee_id,
            state: TaskState::New,
            description: description.trim().to_string(),
        };
        self.board.append_task(task.clone());
        self.persist();
        info!(
            "event=task_create module=service status=ok task_id={} assigned={}",
            task.id,
            task.assignee_id.is_some()
        );
        Ok(task)
    }

    /// Applies a patch to a task, relocating it when its state changes.
    ///
    /// # Contract
    /// - Field and transition checks run before the edit permission check.
    /// - A state change must be in the transition table, or be an admin moving
    ///   a task back to `new`.
    /// - A relocated task is prepended to its destination column.
    /// - Without a state change the task keeps its position.
    ///
    /// # Errors
    /// - `TaskNotFound` when `task_id` does not exist.
    /// - `Validation` for blank text, unknown assignee or a forbidden transition.
    /// - `Permission` when the requester may not edit the task.
    pub fn update_task(
        &mut self,
        session: &Session,
        task_id: &TaskId,
        patch: TaskPatch,
    ) -> BoardResult<Task> {
        let result = self.update_task_inner(session, task_id, patch);
        log_rejection("update_task", &result);
        result
    }

    fn update_task_inner(
        &mut self,
        session: &Session,
        task_id: &TaskId,
        patch: TaskPatch,
    ) -> BoardResult<Task> {
        let current = self
            .board
            .task(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.clone()))?;
        let from = current.state;
        let requester = self.board.user(session.user_id());
        let role = requester.map_or(Role::Member, |user| user.role);

        let mut errors = ValidationErrors::new();
        self.check_text_fields(
            patch.title.as_deref(),
            patch.description.as_deref(),
            &mut errors,
        );
        if let Some(assignee_id) = &patch.assignee_id {
            self.check_assignee(assignee_id.as_ref(), &mut errors);
        }
        let destination = patch.state.filter(|to| *to != from);
        if let Some(to) = destination {
            if !is_transition_allowed(from, to, role) {
                errors.push(
                    Field::State,
                    FieldReason::TransitionNotAllowed { from, to },
                );
            }
        }
        errors.into_result()?;

        let editable = requester.is_some_and(|user| can_edit_task(user, current));
        if !editable {
            return Err(BoardError::Permission {
                action: GuardedAction::EditTask,
            });
        }

        let updated = match destination {
            Some(to) => {
                let mut task = self
                    .board
                    .remove_task(task_id)
                    .ok_or_else(|| BoardError::TaskNotFound(task_id.clone()))?;
                apply_patch(&mut task, patch);
                task.state = to;
                self.board.prepend_task(task.clone());
                task
            }
            None => {
                let task = self
                    .board
                    .task_mut(task_id)
                    .ok_or_else(|| BoardError::TaskNotFound(task_id.clone()))?;
                apply_patch(task, patch);
                task.clone()
            }
        };
        self.persist();
        info!(
            "event=task_update module=service status=ok task_id={} from_state={} to_state={}",
            updated.id, from, updated.state
        );
        Ok(updated)
    }

    /// Drag-and-drop placement. Same rules as a state-only `update_task`.
    pub fn move_task(
        &mut self,
        session: &Session,
        task_id: &TaskId,
        to: TaskState,
    ) -> BoardResult<()> {
        self.update_task(session, task_id, TaskPatch::state(to))
            .map(|_| ())
    }

    /// Removes a task from its column. Admin only.
    pub fn delete_task(&mut self, session: &Session, task_id: &TaskId) -> BoardResult<()> {
        let result = self.delete_task_inner(session, task_id);
        log_rejection("delete_task", &result);
        result
    }

    fn delete_task_inner(&mut self, session: &Session, task_id: &TaskId) -> BoardResult<()> {
        self.require_admin(session, GuardedAction::DeleteTask)?;
        let removed = self
            .board
            .remove_task(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.clone()))?;

        self.persist();
        info!(
            "event=task_delete module=service status=ok task_id={} state={}",
            removed.id, removed.state
        );
        Ok(())
    }

    /// States the edit form offers the requester for this task, overlay first.
    pub fn allowed_transitions(
        &self,
        session: &Session,
        task_id: &TaskId,
    ) -> BoardResult<Vec<TaskState>> {
        let task = self
            .board
            .task(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.clone()))?;
        let role = self
            .board
            .user(session.user_id())
            .map_or(Role::Member, |user| user.role);
        Ok(allowed_transitions(task.state, role))
    }

    /// Per-column tasks visible to `viewer`, column order preserved.
    pub fn visible_tasks<'a>(&'a self, viewer: &'a User) -> Vec<ColumnView<'a>> {
        self.board
            .columns()
            .iter()
            .map(|(state, tasks)| ColumnView {
                state,
                tasks: tasks
                    .iter()
                    .filter(|task| can_view_task(viewer, task))
                    .collect(),
            })
            .collect()
    }

    /// Unassigned tasks across all columns, tagged with their column, filtered for `viewer`.
    pub fn unassigned_tasks<'a>(&'a self, viewer: &'a User) -> Vec<(TaskState, &'a Task)> {
        self.board
            .columns()
            .iter()
            .flat_map(|(state, tasks)| {
                tasks
                    .iter()
                    .filter(|task| task.is_unassigned())
                    .map(move |task| (state, task))
            })
            .filter(|(_, task)| can_view_task(viewer, task))
            .collect()
    }

    /// Number of tasks in any column assigned to `user_id`.
    pub fn assigned_task_count(&self, user_id: &UserId) -> usize {
        self.board
            .tasks()
            .filter(|task| task.is_assigned_to(user_id))
            .count()
    }

    /// Replaces the whole board with an imported JSON document.
    ///
    /// # Contract
    /// - Missing or `null` top-level `users` / `tasks` keys are reported together.
    /// - Undecodable documents and invariant violations are rejected.
    /// - On success the previous board is discarded in one step and persisted.
    pub fn import_json(&mut self, document: &str) -> BoardResult<()> {
        let result = self.import_json_inner(document);
        log_rejection("board_import", &result);
        result
    }

    fn import_json_inner(&mut self, document: &str) -> BoardResult<()> {
        let value: Value = serde_json::from_str(document).map_err(malformed)?;
        if !value.is_object() {
            return Err(malformed("expected a JSON object"));
        }

        let mut errors = ValidationErrors::new();
        for (key, field) in [("users", Field::Users), ("tasks", Field::Tasks)] {
            if value.get(key).map_or(true, Value::is_null) {
                errors.push(field, FieldReason::Missing);
            }
        }
        errors.into_result()?;

        let snapshot: BoardSnapshot = serde_json::from_value(value).map_err(malformed)?;
        self.board = Board::from_snapshot(snapshot)?;
        self.persist();
        info!(
            "event=board_import module=service status=ok user_count={} task_count={}",
            self.board.users().len(),
            self.board.columns().len()
        );
        Ok(())
    }

    /// Renders the board in persisted layout as pretty-printed JSON.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.board.to_snapshot())
    }

    fn requester(&self, session: &Session, action: GuardedAction) -> BoardResult<&User> {
        self.board
            .user(session.user_id())
            .ok_or(BoardError::Permission { action })
    }

    fn require_admin(&self, session: &Session, action: GuardedAction) -> BoardResult<&User> {
        let requester = self.requester(session, action)?;
        if requester.is_admin() {
            Ok(requester)
        } else {
            Err(BoardError::Permission { action })
        }
    }

    fn check_text_fields(
        &self,
        title: Option<&str>,
        description: Option<&str>,
        errors: &mut ValidationErrors,
    ) {
        if title.is_some_and(|value| value.trim().is_empty()) {
            errors.push(Field::Title, FieldReason::Required);
        }
        if description.is_some_and(|value| value.trim().is_empty()) {
            errors.push(Field::Description, FieldReason::Required);
        }
    }

    fn check_assignee(&self, assignee_id: Option<&UserId>, errors: &mut ValidationErrors) {
        if let Some(id) = assignee_id {
            if self.board.user(id).is_none() {
                errors.push(Field::Assignee, FieldReason::UnknownUser(id.clone()));
            }
        }
    }

    fn persist(&self) {
        match self.store.save(&self.board.to_snapshot()) {
            Ok(()) => debug!("event=board_persist module=service status=ok"),
            Err(err) => warn!(
                "event=board_persist module=service status=error error={}",
                err
            ),
        }
    }
}

fn apply_patch(task: &mut Task, patch: TaskPatch) {
    if let Some(title) = patch.title {
        task.title = title.trim().to_string();
    }
    if let Some(description) = patch.description {
        task.description = description.trim().to_string();
    }
    if let Some(assignee_id) = patch.assignee_id {
        task.assignee_id = assignee_id;
    }
}

fn malformed(err: impl ToString) -> BoardError {
    BoardError::Validation(ValidationErrors::single(
        Field::Document,
        FieldReason::Malformed(err.to_string()),
    ))
}

fn log_rejection<T>(event: &str, result: &BoardResult<T>) {
    if let Err(err) = result {
        info!(
            "event={} module=service status=rejected error_code={}",
            event,
            err.code()
        );
    }
}
