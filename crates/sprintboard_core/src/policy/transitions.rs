//! Task state-transition table with the admin overlay.

use crate::model::task::TaskState;
use crate::model::user::Role;

/// Targets reachable from `from` on the edit path, ignoring role.
pub fn table_targets(from: TaskState) -> &'static [TaskState] {
    use TaskState::{Blocked, Done, InProgress, New, Resolved};

    match from {
        New => &[InProgress, Blocked, Resolved, Done],
        InProgress => &[Blocked, Resolved, Done],
        Blocked => &[InProgress, Resolved, Done],
        Resolved => &[InProgress, Blocked, Done],
        Done => &[InProgress],
    }
}

/// States a requester with `role` may move a task in `from` to.
///
/// Admins get `new` prepended for any task not already in `new`.
pub fn allowed_transitions(from: TaskState, role: Role) -> Vec<TaskState> {
    let mut allowed = Vec::with_capacity(5);
    if role.is_admin() && from != TaskState::New {
        allowed.push(TaskState::New);
    }
    allowed.extend_from_slice(table_targets(from));
    allowed
}

/// Returns whether `from -> to` is permitted for `role`. Self-transitions are not.
pub fn is_transition_allowed(from: TaskState, to: TaskState, role: Role) -> bool {
    if from == to {
        return false;
    }
    if to == TaskState::New {
        return role.is_admin();
    }
    table_targets(from).contains(&to)
}
