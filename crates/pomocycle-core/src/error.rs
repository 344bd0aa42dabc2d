//! Core error types for pomocycle-core.
//!
//! Every rejected operation returns one of these with no state change.
//! Failures of side channels (store writes, gateways) are logged by the
//! lifecycle manager instead of being surfaced to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Umbrella error for hosts that drive several subsystems at once.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session lifecycle misuse
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Session store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Countdown misuse reported by the timer engine.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    #[error("a countdown is already active")]
    AlreadyRunning,

    #[error("timer is not running")]
    NotRunning,

    #[error("timer is not paused")]
    NotPaused,
}

/// Rejected lifecycle commands. None of these change state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// A session is already active or paused.
    #[error("a session is already in progress")]
    SlotOccupied,

    /// Reset/annotate with an empty slot.
    #[error("no session in progress")]
    NoActiveSession,

    #[error("session is not running")]
    NotRunning,

    #[error("session is not paused")]
    NotPaused,

    /// `skip_break` while no break is suggested (or a session is running).
    #[error("no pending break to skip")]
    NoPendingBreak,

    #[error(transparent)]
    Timer(#[from] TimerError),
}

/// Session store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Stored row could not be decoded into a session.
    #[error("Corrupt session record: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store temporarily unreachable (lock poisoned, backend offline).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a fire-and-forget collaborator hook.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("task progress update failed for '{task_id}': {message}")]
    TaskProgress { task_id: String, message: String },

    #[error("notification failed: {0}")]
    Notification(String),
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

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<std::sync::PoisonError<std::sync::MutexGuard<'_, rusqlite::Connection>>> for StoreError {
    fn from(err: std::sync::PoisonError<std::sync::MutexGuard<'_, rusqlite::Connection>>) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
