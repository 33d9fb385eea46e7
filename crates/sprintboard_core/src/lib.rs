//! Core domain logic for the sprint board.
//! This crate is the single source of truth for board invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::board::{Board, InvariantViolation, TaskColumns};
pub use model::snapshot::{BoardSnapshot, DEFAULT_ADMIN_ID, DEFAULT_TASK_ID};
pub use model::task::{Task, TaskId, TaskPatch, TaskState};
pub use model::user::{Role, User, UserId};
pub use policy::{allowed_transitions, can_edit_task, is_transition_allowed};
pub use repo::board_store::{
    BoardStore, SqliteBoardStore, StoreError, StoreResult, DEFAULT_STORAGE_KEY,
};
pub use service::board_service::{BoardService, ColumnView, Session, UNASSIGNED_LABEL};
pub use service::error::{
    BoardError, BoardResult, Field, FieldError, FieldReason, GuardedAction, ValidationErrors,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
