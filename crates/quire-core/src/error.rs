//! Error types for quire.

use thiserror::Error;

/// Result type alias using quire's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for quire operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Notebook not found (or not owned by the caller)
    #[error("Notebook not found: {0}")]
    NotebookNotFound(uuid::Uuid),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("group".to_string());
        assert_eq!(err.to_string(), "Not found: group");
    }

    #[test]
    fn test_error_display_notebook_not_found() {
        let id = Uuid::nil();
        let err = Error::NotebookNotFound(id);
        assert_eq!(err.to_string(), format!("Notebook not found: {}", id));
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("groups.take must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid input: groups.take must be positive"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("unknown STORE_CONTEXT".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown STORE_CONTEXT");
    }

    #[test]
    fn test_error_display_internal() {
        let err = Error::Internal("unexpected state".to_string());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("invalid token".to_string());
        assert_eq!(err.to_string(), "Unauthorized: invalid token");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
