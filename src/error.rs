//! Error types for Gas Town
//!
//! Defines a comprehensive error enum covering all failure modes across the system.
//! Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for Gas Town operations
pub type Result<T> = std::result::Result<T, GasTownError>;

/// Comprehensive error type for Gas Town operations
#[derive(Error, Debug)]
pub enum GasTownError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No fallback policy registered for a role
    #[error("no fallback policy configured for role '{0}'")]
    NoPolicyForRole(String),

    /// A role's fallback chain has no profiles
    #[error("fallback chain for role '{0}' is empty")]
    EmptyFallbackChain(String),

    /// Every profile in the fallback chain is cooling down
    #[error("all profiles are cooling down")]
    AllProfilesCooling,

    /// Fallback profile selection failures, with handling context
    #[error("selecting fallback profile: {0}")]
    Selection(String),

    /// Session controller errors (tmux, process spawning)
    #[error("session error: {0}")]
    Session(String),

    /// Operation aborted by a cancellation token
    #[error("operation canceled")]
    Canceled,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GasTownError::NoPolicyForRole("polecat".to_string());
        assert_eq!(
            err.to_string(),
            "no fallback policy configured for role 'polecat'"
        );

        let err = GasTownError::AllProfilesCooling;
        assert_eq!(err.to_string(), "all profiles are cooling down");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: GasTownError = io_err.into();
        assert!(matches!(err, GasTownError::Io(_)));
    }
}
