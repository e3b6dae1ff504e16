//! Shared error types for import validation

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for importvet operations
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed source in a single file; the run continues without it
    #[error("Parse error in {file}:{line}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// Unexpected failure while analyzing one file's parsed tree
    #[error("Analysis error in {file}: {message}")]
    Analysis { file: PathBuf, message: String },

    /// Invalid weight factors or other bad configuration; aborts before analysis
    #[error("Configuration error: {0}")]
    Config(String),

    /// Project root missing or inaccessible; aborts the whole run
    #[error("Project error at {path}: {message}")]
    Project { path: PathBuf, message: String },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Ignore-glob pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Directory walk errors
    #[error(transparent)]
    Walk(#[from] ignore::Error),
}

impl Error {
    /// Create a parse error with location
    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a file-scoped analysis error
    pub fn analysis(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Analysis {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a project-level fatal error
    pub fn project(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Project {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run.
    ///
    /// Parse and analysis errors are scoped to one file and are collected
    /// rather than propagated.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Parse { .. } | Self::Analysis { .. })
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_are_recoverable() {
        let err = Error::parse("src/app.py", 3, "unexpected indent");
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("src/app.py:3"));
    }

    #[test]
    fn config_errors_are_fatal() {
        let err = Error::config("missing weight key");
        assert!(err.is_fatal());
    }

    #[test]
    fn project_error_carries_path() {
        let err = Error::project("/no/such/root", "directory not found");
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/no/such/root"));
    }
}
