//! Error taxonomy for board operations.
//!
//! # Invariants
//! - Every variant is recoverable and returned to the caller.
//! - A `ValidationErrors` value carries at most one reason per field.

use crate::model::board::InvariantViolation;
use crate::model::task::{TaskId, TaskState};
use crate::model::user::UserId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BoardResult<T> = Result<T, BoardError>;

/// Input field a validation failure is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Title,
    Description,
    Assignee,
    State,
    /// Top-level `users` key of an imported document.
    Users,
    /// Top-level `tasks` key of an imported document.
    Tasks,
    /// Imported document as a whole.
    Document,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Title => "title",
            Self::Description => "description",
            Self::Assignee => "assignee",
            Self::State => "state",
            Self::Users => "users",
            Self::Tasks => "tasks",
            Self::Document => "document",
        }
    }
}

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldReason {
    /// Blank after trimming.
    Required,
    /// Collides with an existing user, compared trimmed and case-insensitively.
    Duplicate,
    /// Names a user that does not exist.
    UnknownUser(UserId),
    TransitionNotAllowed { from: TaskState, to: TaskState },
    /// Required key absent from an imported document.
    Missing,
    /// Imported document could not be decoded.
    Malformed(String),
}

impl Display for FieldReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "is required"),
            Self::Duplicate => write!(f, "already exists"),
            Self::UnknownUser(id) => write!(f, "references unknown user {id}"),
            Self::TransitionNotAllowed { from, to } => {
                write!(f, "cannot move from `{from}` to `{to}`")
            }
            Self::Missing => write!(f, "is missing"),
            Self::Malformed(message) => write!(f, "is malformed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub reason: FieldReason,
}

/// Multi-field validation outcome. Fields are reported together, not fail-fast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`, replacing any earlier reason for it.
    pub fn push(&mut self, field: Field, reason: FieldReason) {
        match self.errors.iter_mut().find(|error| error.field == field) {
            Some(existing) => existing.reason = reason,
            None => self.errors.push(FieldError { field, reason }),
        }
    }

    pub fn single(field: Field, reason: FieldReason) -> Self {
        let mut errors = Self::new();
        errors.push(field, reason);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn reason(&self, field: Field) -> Option<&FieldReason> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| &error.reason)
    }

    pub fn has(&self, field: Field) -> bool {
        self.reason(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing was recorded, otherwise `BoardError::Validation`.
    pub fn into_result(self) -> BoardResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(BoardError::Validation(self))
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (position, error) in self.errors.iter().enumerate() {
            if position > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} {}", error.field.as_str(), error.reason)?;
        }
        Ok(())
    }
}

/// Operation that requires a privilege the requester lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedAction {
    DeleteUser,
    DeleteTask,
    EditTask,
    SelectUser,
}

impl GuardedAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeleteUser => "delete_user",
            Self::DeleteTask => "delete_task",
            Self::EditTask => "edit_task",
            Self::SelectUser => "select_user",
        }
    }
}

/// Error returned by board operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    Validation(ValidationErrors),
    Permission { action: GuardedAction },
    Invariant(InvariantViolation),
    UserNotFound(UserId),
    TaskNotFound(TaskId),
    /// No user matches both name and email.
    Auth,
}

impl BoardError {
    /// Validation details, when this is a validation failure.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Permission { .. } => "permission",
            Self::Invariant(_) => "invariant",
            Self::UserNotFound(_) | Self::TaskNotFound(_) => "not_found",
            Self::Auth => "auth",
        }
    }
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "validation failed: {errors}"),
            Self::Permission { action } => {
                write!(f, "permission denied for {}", action.as_str())
            }
            Self::Invariant(violation) => write!(f, "{violation}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Auth => write!(f, "invalid username or password"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invariant(violation) => Some(violation),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for BoardError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<InvariantViolation> for BoardError {
    fn from(value: InvariantViolation) -> Self {
        Self::Invariant(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardError, Field, FieldReason, ValidationErrors};

    #[test]
    fn push_keeps_one_reason_per_field() {
        let mut errors = ValidationErrors::new();
        errors.push(Field::Name, FieldReason::Required);
        errors.push(Field::Email, FieldReason::Required);
        errors.push(Field::Name, FieldReason::Duplicate);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.reason(Field::Name), Some(&FieldReason::Duplicate));
    }

    #[test]
    fn display_lists_every_field() {
        let mut errors = ValidationErrors::new();
        errors.push(Field::Title, FieldReason::Required);
        errors.push(Field::Description, FieldReason::Required);
        let message = BoardError::Validation(errors).to_string();
        assert_eq!(
            message,
            "validation failed: title is required; description is required"
        );
    }

    #[test]
    fn empty_errors_convert_to_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
