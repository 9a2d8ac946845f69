//! Error types for scope, client and manager operations.
//!
//! Every failure surfaced to a frontend carries an [`ErrorKind`] so that
//! [`crate::types::OperationResult`] can report it in a stable form.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, McpmError>;

/// Stable classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownClient,
    UnknownScope,
    AmbiguousScope,
    NotFound,
    AlreadyPresent,
    ReadOnlyScope,
    ValidationError,
    MalformedConfig,
    UnsupportedOperation,
    #[serde(rename = "IOError")]
    IoError,
    UnsupportedPlatform,
    TestModeViolation,
    SettingsError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnknownClient => "UnknownClient",
            ErrorKind::UnknownScope => "UnknownScope",
            ErrorKind::AmbiguousScope => "AmbiguousScope",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::AlreadyPresent => "AlreadyPresent",
            ErrorKind::ReadOnlyScope => "ReadOnlyScope",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::MalformedConfig => "MalformedConfig",
            ErrorKind::UnsupportedOperation => "UnsupportedOperation",
            ErrorKind::IoError => "IOError",
            ErrorKind::UnsupportedPlatform => "UnsupportedPlatform",
            ErrorKind::TestModeViolation => "TestModeViolation",
            ErrorKind::SettingsError => "SettingsError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum McpmError {
    #[error("unknown client '{0}'")]
    UnknownClient(String),

    #[error("client '{client}' has no scope named '{scope}'")]
    UnknownScope { client: String, scope: String },

    /// Auto-detection found the server in more than one scope.
    #[error("server '{id}' is installed in several scopes ({}); pick one with --scope", .scopes.join(", "))]
    AmbiguousScope { id: String, scopes: Vec<String> },

    #[error("server '{id}' not found {location}")]
    NotFound { id: String, location: String },

    #[error("server '{id}' already exists in scope '{scope}'")]
    AlreadyPresent { id: String, scope: String },

    #[error("scope '{0}' is read-only")]
    ReadOnlyScope(String),

    /// One or more rule violations; each one is listed in the message.
    #[error("invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Existing file could not be parsed. It is never rewritten.
    #[error("malformed config file {}: {reason}. Repair or remove the file and retry", .path.display())]
    MalformedConfig { path: PathBuf, reason: String },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported platform '{0}'")]
    UnsupportedPlatform(String),

    #[error("TEST_MODE is set: {0}")]
    TestModeViolation(String),

    #[error("settings error: {0}")]
    Settings(String),
}

impl McpmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            McpmError::UnknownClient(_) => ErrorKind::UnknownClient,
            McpmError::UnknownScope { .. } => ErrorKind::UnknownScope,
            McpmError::AmbiguousScope { .. } => ErrorKind::AmbiguousScope,
            McpmError::NotFound { .. } => ErrorKind::NotFound,
            McpmError::AlreadyPresent { .. } => ErrorKind::AlreadyPresent,
            McpmError::ReadOnlyScope(_) => ErrorKind::ReadOnlyScope,
            McpmError::Validation(_) => ErrorKind::ValidationError,
            McpmError::MalformedConfig { .. } => ErrorKind::MalformedConfig,
            McpmError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            McpmError::Io { .. } => ErrorKind::IoError,
            McpmError::UnsupportedPlatform(_) => ErrorKind::UnsupportedPlatform,
            McpmError::TestModeViolation(_) => ErrorKind::TestModeViolation,
            McpmError::Settings(_) => ErrorKind::SettingsError,
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        McpmError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn not_found(id: &str, location: impl Into<String>) -> Self {
        McpmError::NotFound {
            id: id.to_string(),
            location: location.into(),
        }
    }

    /// Render as `"<Kind>: <message>"`, the form stored in `OperationResult::errors`.
    pub fn to_error_string(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}
