//! Domain model for the sprint board.
//!
//! # Responsibility
//! - Define users, tasks and the board aggregate that owns them.
//! - Define the persisted snapshot layout shared by storage and import/export.
//!
//! # Invariants
//! - Every user and task is identified by a stable, board-unique id.
//! - Assignees are weak id references, never owned objects.

pub mod board;
pub mod snapshot;
pub mod task;
pub mod user;
