//! Error types for Steam Fusion.
//!
//! Only the validation variants ([`FusionError::InvalidGameId`] and
//! [`FusionError::AlreadyStarted`]) ever reach a host directly; every other
//! variant is caught at the controller boundary, logged, and turned into a
//! terminal event.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Steam Fusion library.
#[derive(Debug, Error)]
pub enum FusionError {
    // Validation errors
    #[error("Invalid game id {game_id:?}: {message}")]
    InvalidGameId { game_id: String, message: String },

    #[error("An action for {game} has already been started")]
    AlreadyStarted { game: String },

    #[error("Game {game} has no install directory")]
    MissingInstallDirectory { game: String },

    // Cancellation
    #[error("Operation cancelled")]
    Cancelled,

    // Account switch tool errors
    #[error("Account switch tool location is not configured")]
    SwitchToolNotConfigured,

    #[error("Failed to launch {program}: {message}")]
    LaunchFailed {
        program: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // Steam client errors
    #[error("Steam installation not found")]
    SteamNotFound,

    #[error("Malformed manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Steam Fusion operations.
pub type Result<T> = std::result::Result<T, FusionError>;

impl From<std::io::Error> for FusionError {
    fn from(err: std::io::Error) -> Self {
        FusionError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for FusionError {
    fn from(err: serde_json::Error) -> Self {
        FusionError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl FusionError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        FusionError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a manifest error for a file that parsed but lacked expected data.
    pub fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        FusionError::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error represents a cancelled run rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FusionError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FusionError::InvalidGameId {
            game_id: "440".into(),
            message: "expected <account>:<title>".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid game id \"440\": expected <account>:<title>"
        );
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        assert!(FusionError::Cancelled.is_cancelled());
        assert!(!FusionError::SwitchToolNotConfigured.is_cancelled());
    }

    #[test]
    fn test_io_with_path_keeps_path() {
        let err = FusionError::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/tmp/loginusers.vdf",
        );
        match err {
            FusionError::Io { path, .. } => {
                assert_eq!(path, Some(PathBuf::from("/tmp/loginusers.vdf")))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
