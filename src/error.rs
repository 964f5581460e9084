//! Error types for task store operations.
//!
//! Every error is recoverable: the store stays usable after any of them, and the
//! view decides how to surface the message.

use std::path::PathBuf;

use thiserror::Error;

/// Exit codes for the CLI.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const STORAGE_FAILED: i32 = 4;
}

/// Main error type for task store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("missing required field: {field}")]
    Validation { field: &'static str },

    #[error("active task limit of {max} reached")]
    CapacityExceeded { max: usize },

    #[error("task {0} not found")]
    NotFound(u64),

    #[error("task file {} is corrupt: {source}", .path.display())]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to access task file {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            StoreError::Validation { .. }
            | StoreError::CapacityExceeded { .. }
            | StoreError::NotFound(_) => exit_codes::USER_ERROR,

            StoreError::CorruptStore { .. } | StoreError::Persistence { .. } => {
                exit_codes::STORAGE_FAILED
            }
        }
    }

    /// Message suitable for showing to the person using the view.
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Validation { .. } => "Please fill all fields.".to_string(),
            StoreError::CapacityExceeded { .. } => {
                "Please finish at least one task to add more.".to_string()
            }
            StoreError::NotFound(_) => "Select a task first.".to_string(),
            StoreError::CorruptStore { path, .. } => format!(
                "Task file {} could not be read; starting with an empty list",
                path.display()
            ),
            StoreError::Persistence { .. } => {
                format!("Changes not saved: {self}")
            }
        }
    }
}

/// Result type alias for task store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(StoreError::Validation { field: "title" }.exit_code(), exit_codes::USER_ERROR);
        assert_eq!(StoreError::CapacityExceeded { max: 5 }.exit_code(), exit_codes::USER_ERROR);
        assert_eq!(StoreError::NotFound(3).exit_code(), exit_codes::USER_ERROR);
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::Persistence { path: PathBuf::from("tasks.json"), source: io };
        assert_eq!(err.exit_code(), exit_codes::STORAGE_FAILED);
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            StoreError::CapacityExceeded { max: 5 }.user_message(),
            "Please finish at least one task to add more."
        );
        assert_eq!(StoreError::Validation { field: "priority" }.user_message(), "Please fill all fields.");
        assert_eq!(StoreError::NotFound(9).to_string(), "task 9 not found");
    }
}
