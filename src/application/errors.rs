//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Skill error: {0}")]
    Skill(#[from] SkillError),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Queue closed: {0}")]
    QueueClosed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Raised when a route or registration is malformed. Retrying with the same
/// input will fail the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Route name must not be empty")]
    EmptyRouteName,

    #[error("Route priority must be between 0 and 99, got {0}")]
    PriorityOutOfRange(i64),

    #[error("Must be a kind of Skill: '{0}' is not registered")]
    UnknownSkill(String),

    #[error("Route '{0}' is already registered")]
    DuplicateRoute(String),

    #[error("Skill '{0}' is already registered")]
    DuplicateSkill(String),

    #[error("Skill '{0}' must be loaded to answer fallback routes")]
    MissingFallback(String),

    #[error("Invalid route pattern for '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },
}

/// Skill execution errors
#[derive(Error, Debug)]
pub enum SkillError {
    #[error("Unknown action '{action}' on skill '{skill}'")]
    UnknownAction { skill: String, action: String },

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed for '{key}': {reason}")]
    Decryption { key: String, reason: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
