//! User domain model.
//!
//! # Responsibility
//! - Define the board member record and its role.
//! - Provide the normalized comparison keys used by duplicate detection and login.
//!
//! # Invariants
//! - `id` is assigned once at creation and never reused on the same board.
//! - `name` and `email` are compared trimmed and lower-cased, never raw.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque stable identifier of a board user, e.g. `u-admin`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps an externally known identifier (persisted or imported data).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Draws a fresh random identifier with the `u-` prefix.
    pub fn generate() -> Self {
        Self(format!("u-{}", short_suffix()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Board role. Admins manage users and tasks; members work their own tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    /// Older snapshots spell this role `user`.
    #[serde(alias = "user")]
    Member,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Board user record in persisted wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Unique per board; doubles as the login credential.
    pub email: String,
    pub role: Role,
}

impl User {
    /// Creates a member with a generated id.
    pub fn new_member(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            name: name.into(),
            email: email.into(),
            role: Role::Member,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Returns whether `candidate` names this user under trimmed, case-insensitive comparison.
    pub fn name_matches(&self, candidate: &str) -> bool {
        normalize_key(&self.name) == normalize_key(candidate)
    }

    /// Returns whether `candidate` is this user's email under trimmed, case-insensitive comparison.
    pub fn email_matches(&self, candidate: &str) -> bool {
        normalize_key(&self.email) == normalize_key(candidate)
    }
}

/// Comparison key for names and emails.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

pub(crate) fn short_suffix() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    simple.chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_key, Role, User, UserId};

    #[test]
    fn generated_ids_carry_prefix_and_differ() {
        let first = UserId::generate();
        let second = UserId::generate();
        assert!(first.as_str().starts_with("u-"));
        assert_ne!(first, second);
    }

    #[test]
    fn matching_ignores_case_and_surrounding_whitespace() {
        let user = User::new_member("Alice", "alice@example.com");
        assert!(user.name_matches("  aLiCe "));
        assert!(user.email_matches("ALICE@example.com\t"));
        assert!(!user.name_matches("Alic"));
        assert_eq!(normalize_key(" MiXed "), "mixed");
    }

    #[test]
    fn legacy_user_role_reads_as_member() {
        let role: Role = serde_json::from_str("\"user\"").expect("legacy role");
        assert_eq!(role, Role::Member);
        assert_eq!(
            serde_json::to_string(&Role::Member).expect("encode role"),
            "\"member\""
        );
    }
}
