//! Error types for path parsing and source scanning

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Path and source-text errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("malformed source text at line {line}, column {column}: {message}")]
    Scan {
        line: usize,
        column: usize,
        message: &'static str,
    },
}

impl Error {
    pub(crate) fn invalid_path(path: &str, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
