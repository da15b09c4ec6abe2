//! Core error types for breathwork-core.
//!
//! Configuration and catalog problems fail fast at load time. Collaborator
//! failures (cues, wake lock) have their own type so call sites can log and
//! drop them without touching the timing state machine.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breathwork-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Exercise catalog errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database and preference store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while building or querying the exercise catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown exercise: {0}")]
    UnknownExercise(String),

    #[error("exercise '{0}' has no phases")]
    EmptyExercise(String),

    #[error("phase '{label}' of exercise '{exercise}' must have a positive duration")]
    NonPositiveDuration { exercise: String, label: String },

    /// The phase label does not name any known cue.
    #[error("phase label '{label}' in exercise '{exercise}' has no cue mapping")]
    UnmappedCue { exercise: String, label: String },

    #[error("duplicate exercise id: {0}")]
    DuplicateExercise(String),

    #[error("catalog has no exercises")]
    EmptyCatalog,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Database and key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    #[error("Preference store unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a best-effort collaborator (cue output, wake lock).
///
/// These never reach the timing core; the controller logs them and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{collaborator} unavailable: {message}")]
    Unavailable {
        collaborator: &'static str,
        message: String,
    },

    #[error("{collaborator} rejected the request: {message}")]
    Rejected {
        collaborator: &'static str,
        message: String,
    },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
