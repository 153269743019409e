//! Error types for the Tabula application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Tabula application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum TabulaError {
    /// Project does not exist
    #[error("Project not found: '{id}'")]
    ProjectNotFound { id: String },

    /// Chat does not exist within a project
    #[error("Chat not found: '{id}'")]
    ChatNotFound { id: String },

    /// Version number does not exist for a project
    #[error("Version {version} not found for project '{project_id}'")]
    VersionNotFound { project_id: String, version: u32 },

    /// Required record is missing or unreadable (strict-mode reads only)
    #[error("Storage corruption at {path}: {message}")]
    StorageCorruption { path: String, message: String },

    /// The code oracle failed or returned an unparseable response
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// A sandboxed snippet raised an exception
    #[error("Execution error: {0}")]
    Execution(String),

    /// A sandboxed snippet exceeded its wall-clock budget
    #[error("Execution timed out after {seconds}s")]
    ExecutionTimeout { seconds: u64 },

    /// Malformed input data (unreadable CSV, empty dataset, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TabulaError {
    /// Creates a ProjectNotFound error
    pub fn project_not_found(id: impl Into<String>) -> Self {
        Self::ProjectNotFound { id: id.into() }
    }

    /// Creates a ChatNotFound error
    pub fn chat_not_found(id: impl Into<String>) -> Self {
        Self::ChatNotFound { id: id.into() }
    }

    /// Creates a VersionNotFound error
    pub fn version_not_found(project_id: impl Into<String>, version: u32) -> Self {
        Self::VersionNotFound {
            project_id: project_id.into(),
            version,
        }
    }

    /// Creates a StorageCorruption error
    pub fn corruption(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageCorruption {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is any of the "not found" variants
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound { .. } | Self::ChatNotFound { .. } | Self::VersionNotFound { .. }
        )
    }

    /// Check if this is a sandbox failure (raise or timeout)
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::Execution(_) | Self::ExecutionTimeout { .. })
    }
}

impl From<std::io::Error> for TabulaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TabulaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TabulaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for TabulaError {
    fn from(err: csv::Error) -> Self {
        Self::Serialization {
            format: "CSV".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for TabulaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, TabulaError>`.
pub type Result<T> = std::result::Result<T, TabulaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_are_detected() {
        assert!(TabulaError::project_not_found("p1").is_not_found());
        assert!(TabulaError::chat_not_found("c1").is_not_found());
        assert!(TabulaError::version_not_found("p1", 3).is_not_found());
        assert!(!TabulaError::Validation("bad".into()).is_not_found());
    }

    #[test]
    fn execution_failures_are_detected() {
        assert!(TabulaError::Execution("boom".into()).is_execution_failure());
        assert!(TabulaError::ExecutionTimeout { seconds: 30 }.is_execution_failure());
        assert!(!TabulaError::Oracle("bad json".into()).is_execution_failure());
    }

    #[test]
    fn io_errors_convert() {
        let err: TabulaError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, TabulaError::Io { .. }));
    }
}
