//! Structured error types for graph operations.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,

    // Not found errors
    TaskNotFound,
    ConnectionNotFound,

    // Invariant violations
    DuplicateId,
    SelfLoop,
}

impl ErrorCode {
    /// True for codes that mean the caller broke a precondition rather than
    /// handing in bad user input.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ErrorCode::TaskNotFound | ErrorCode::ConnectionNotFound | ErrorCode::DuplicateId
        )
    }
}

/// Structured error returned by graph store operations.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GraphError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl GraphError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn connection_not_found(connection_id: &str) -> Self {
        Self::new(
            ErrorCode::ConnectionNotFound,
            format!("Connection not found: {}", connection_id),
        )
    }

    pub fn duplicate_id(id: &str) -> Self {
        Self::new(ErrorCode::DuplicateId, format!("Id already in use: {}", id))
    }

    pub fn self_loop(task_id: &str) -> Self {
        Self::new(
            ErrorCode::SelfLoop,
            format!("Task {} cannot be connected to itself", task_id),
        )
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GraphError {}

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_sets_field() {
        let err = GraphError::missing_field("title");
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert_eq!(err.field.as_deref(), Some("title"));
        assert_eq!(err.to_string(), "title is required");
    }

    #[test]
    fn test_precondition_codes() {
        assert!(ErrorCode::TaskNotFound.is_precondition());
        assert!(ErrorCode::DuplicateId.is_precondition());
        assert!(!ErrorCode::MissingRequiredField.is_precondition());
        assert!(!ErrorCode::SelfLoop.is_precondition());
    }

    #[test]
    fn test_serializes_code_in_screaming_case() {
        let err = GraphError::task_not_found("t9");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "TASK_NOT_FOUND");
        assert!(json.get("field").is_none());
    }
}
