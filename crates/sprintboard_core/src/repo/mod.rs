//! Persistence layer for board state.
//!
//! # Responsibility
//! - Define the storage contract the service persists through.
//! - Isolate SQLite and JSON encoding details from business rules.
//!
//! # Invariants
//! - Stores hold whole snapshots; the service never writes partial state.

pub mod board_store;
