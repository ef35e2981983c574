//! Error types for rule construction and loading
//!
//! Evaluation itself never fails: missing paths, unmatched resource types and values of
//! an unexpected kind all evaluate to ordinary results. Every variant here is raised while
//! a rule, rule set or configuration is being built.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A malformed rule definition or API misuse
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    InvalidPath(#[from] bastion_jsonpath::Error),

    #[error("invalid regular expression '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{id}': {source}")]
    InvalidRule {
        id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("duplicate rule id '{0}'")]
    DuplicateRule(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed template: {0}")]
    InvalidTemplate(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// True for malformed definitions and API misuse, including those reported for a
    /// specific rule.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Self::InvalidArgument(_) | Self::InvalidPath(_) | Self::InvalidRegex { .. } => true,
            Self::InvalidRule { source, .. } => source.is_invalid_argument(),
            _ => false,
        }
    }
}
