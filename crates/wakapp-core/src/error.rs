//! Core error types for wakapp-core.
//!
//! Every failure the model can produce is one of the variants below. None of
//! them is fatal: callers either show a message or degrade to a no-op.

use std::path::PathBuf;
use thiserror::Error;

use crate::alarm::WakeMethod;
use crate::friends::FriendshipStatus;

/// Core error type for wakapp-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Bad input, caught before any network call
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A required choice is missing
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Target record is absent
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Operation is not legal from the record's current status
    #[error("Cannot {action} a friendship in status '{from}'")]
    InvalidTransition {
        action: &'static str,
        from: FriendshipStatus,
    },

    /// The same operation on the same record is still running
    #[error("{action} already in progress for {id}")]
    Busy { action: &'static str, id: String },

    /// Network or remote service failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Local storage read/write failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Input validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No wake method was picked for the alarm
    #[error("Please select at least one wake-up method (voice, video, song or puzzle)")]
    NoMethodSelected,

    /// Some selected wake methods have no uploaded media
    #[error("Missing media for: {}", join_methods(.0))]
    MissingMedia(Vec<WakeMethod>),

    /// A required text field is blank after trimming
    #[error("'{field}' must not be empty")]
    EmptyField { field: &'static str },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Missing or unusable selections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Alarm targets a friend but none was chosen
    #[error("Please select a friend")]
    NoFriendSelected,

    /// Chosen friend has not accepted the friendship yet
    #[error("Friend '{name}' has not accepted yet (status: {status})")]
    FriendNotAccepted {
        name: String,
        status: FriendshipStatus,
    },
}

/// Remote service failures.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request never produced a usable response
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Base URL or path could not be combined
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Server answered with success but a body this client cannot read
    #[error("Malformed response body: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Local storage failures.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    /// Stored value could not be encoded or decoded
    #[error("Corrupt stored value for '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[source] std::io::Error),
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

fn join_methods(methods: &[WakeMethod]) -> String {
    methods
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        CoreError::Transport(TransportError::Request(err))
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Persistence(PersistenceError::QueryFailed(err))
    }
}

impl CoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether retrying the same action later could succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, CoreError::Transport(_))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
