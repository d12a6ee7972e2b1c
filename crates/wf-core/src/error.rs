//! Error types for wf-core

use thiserror::Error;

/// Core error type for wardflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Schedule interval is neither a preset nor a valid cron expression
    #[error("[E004] Invalid schedule '{value}': {message}")]
    InvalidSchedule { value: String, message: String },

    /// E005: A run tried to move through the state machine out of order
    #[error("[E005] Invalid run transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    /// E006: Run state file could not be decoded
    #[error("[E006] Corrupt run state at '{path}': {message}")]
    CorruptRunState { path: String, message: String },

    /// E014: IO error
    #[error("[E014] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E016: IO error with file path context
    #[error("[E016] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E015: YAML parse error
    #[error("[E015] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
