//! Error types for Stepwright

use thiserror::Error;

/// Result type alias using Stepwright Error
pub type Result<T> = std::result::Result<T, Error>;

/// Stepwright error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("{kind} named '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("Step {id} not found in test case {test_case_id}")]
    StepNotFound { id: i64, test_case_id: i64 },

    #[error("Test case {id} not found")]
    TestCaseNotFound { id: i64 },

    #[error("Proposed ordering assigns order index {order_index} twice")]
    DuplicateOrderIndex { order_index: i64 },

    #[error("Unsupported action type '{0}'")]
    UnsupportedAction(String),

    #[error("Store lock not acquired within {ms}ms")]
    StoreTimeout { ms: u64 },
}
