//! Role-based access predicates and the admin invariant.

use crate::model::board::InvariantViolation;
use crate::model::task::Task;
use crate::model::user::User;

/// Admins edit everything; members edit only tasks assigned to them.
pub fn can_edit_task(user: &User, task: &Task) -> bool {
    user.is_admin() || task.is_assigned_to(&user.id)
}

/// Board visibility filter. Same rule as editing.
pub fn can_view_task(user: &User, task: &Task) -> bool {
    can_edit_task(user, task)
}

/// Fails with `LastAdmin` unless `remaining` still holds an admin.
pub fn ensure_admin_remains<'a>(
    remaining: impl IntoIterator<Item = &'a User>,
) -> Result<(), InvariantViolation> {
    if remaining.into_iter().any(User::is_admin) {
        Ok(())
    } else {
        Err(InvariantViolation::LastAdmin)
    }
}
