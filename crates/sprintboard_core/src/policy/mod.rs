//! Board mutation policy.
//!
//! # Responsibility
//! - Own the task state-transition table and the admin overlay.
//! - Own the task edit permission predicate.
//! - Own the "at least one admin" invariant check.
//!
//! # Invariants
//! - Every code path that removes users or replaces the user set calls
//!   `ensure_admin_remains` on the resulting set.

mod access;
mod transitions;

pub use access::{can_edit_task, can_view_task, ensure_admin_remains};
pub use transitions::{allowed_transitions, is_transition_allowed, table_targets};
