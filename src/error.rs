//! Error types for Prebake
//!
//! All modules use `PrebakeResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Prebake operations
pub type PrebakeResult<T> = Result<T, PrebakeError>;

/// All errors that can occur in Prebake
#[derive(Error, Debug)]
pub enum PrebakeError {
    // Version derivation errors
    #[error("No readable revision for {path}: {reason}")]
    VersionUnavailable { path: PathBuf, reason: String },

    #[error("Invalid revision identifier '{revision}': {reason}")]
    RevisionInvalid { revision: String, reason: String },

    // Local cache errors
    #[error("Failed to write cache entry {path}: {reason}")]
    CacheWriteFailed { path: PathBuf, reason: String },

    // Remote store errors
    #[error("Remote store unreachable via {tool}: {reason}")]
    RemoteUnreachable { tool: String, reason: String },

    // Extraction errors
    #[error("Failed to extract archive {path}: {reason}")]
    ExtractionFailed { path: PathBuf, reason: String },

    // Policy errors
    #[error("Component '{component}' requires a prebuilt artifact but none was usable: {reason}")]
    PolicyViolation { component: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl PrebakeError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a version-unavailable error
    pub fn version_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::VersionUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a cache-write error
    pub fn cache_write(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CacheWriteFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a remote-unreachable error
    pub fn remote_unreachable(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemoteUnreachable {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Create an extraction error
    pub fn extraction(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this condition must be absorbed into a from-source fallback
    /// rather than aborting the configuration pass.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            Self::VersionUnavailable { .. }
                | Self::RevisionInvalid { .. }
                | Self::CacheWriteFailed { .. }
                | Self::RemoteUnreachable { .. }
                | Self::ExtractionFailed { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::VersionUnavailable { .. } => {
                Some("Ensure the component path is inside a git checkout")
            }
            Self::RemoteUnreachable { .. } => {
                Some("Check that the object store tool is installed and configured")
            }
            Self::PolicyViolation { .. } => {
                Some("Unset require_prebuilt for this component to allow a from-source build")
            }
            _ => None,
        }
    }
}
