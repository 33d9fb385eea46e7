//! Core use-case services.
//!
//! # Responsibility
//! - Turn board operations into validated, permission-checked mutations.
//! - Keep callers decoupled from storage details.

pub mod board_service;
pub mod error;
