//! Persisted board layout and the built-in default board.
//!
//! The same shape is used for the key-value store entry, supplied fallback
//! snapshots, and import/export documents.

use crate::model::board::TaskColumns;
use crate::model::task::{Task, TaskId, TaskState};
use crate::model::user::{Role, User, UserId};
use serde::{Deserialize, Serialize};

/// Id of the administrator seeded into the default board.
pub const DEFAULT_ADMIN_ID: &str = "u-admin";
/// Id of the welcome task seeded into the default board.
pub const DEFAULT_TASK_ID: &str = "t-1";

/// Serializable board state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub users: Vec<User>,
    pub tasks: TaskColumns,
    #[serde(default)]
    pub current_user_id: Option<UserId>,
}

impl BoardSnapshot {
    /// One admin, one welcome task in `new`, admin selected.
    pub fn default_board() -> Self {
        let admin_id = UserId::new(DEFAULT_ADMIN_ID);
        let admin = User {
            id: admin_id.clone(),
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
        };
        let welcome = Task {
            id: TaskId::new(DEFAULT_TASK_ID),
            title: "Welcome to Sprint Board".to_string(),
            assignee_id: None,
            state: TaskState::New,
            description: "Intro task".to_string(),
        };

        Self {
            users: vec![admin],
            tasks: TaskColumns {
                new: vec![welcome],
                ..TaskColumns::default()
            },
            current_user_id: Some(admin_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BoardSnapshot;
    use serde_json::json;

    #[test]
    fn default_board_uses_persisted_wire_shape() {
        let value = serde_json::to_value(BoardSnapshot::default_board()).expect("encode");
        assert_eq!(
            value,
            json!({
                "users": [
                    { "id": "u-admin", "name": "Admin", "email": "admin@example.com", "role": "admin" }
                ],
                "tasks": {
                    "new": [
                        {
                            "id": "t-1",
                            "title": "Welcome to Sprint Board",
                            "assigneeId": null,
                            "state": "new",
                            "description": "Intro task"
                        }
                    ],
                    "inprogress": [],
                    "blocked": [],
                    "resolved": [],
                    "done": []
                },
                "currentUserId": "u-admin"
            })
        );
    }

    #[test]
    fn missing_columns_and_current_user_decode_as_empty() {
        let snapshot: BoardSnapshot = serde_json::from_value(json!({
            "users": [],
            "tasks": { "done": [] }
        }))
        .expect("decode partial snapshot");
        assert!(snapshot.tasks.is_empty());
        assert_eq!(snapshot.current_user_id, None);
    }
}
