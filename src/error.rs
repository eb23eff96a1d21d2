//! All error types for the csfkit crate.
//!
//! These are returned from all fallible operations (parsing, serialization,
//! reconciliation, watch mode).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new validation error
    pub fn validation_error(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Creates a new invalid-data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData(message.into())
    }

    pub(crate) fn invalid_label(label: &str) -> Self {
        Error::Validation(format!("Invalid characters found in label name \"{label}\"."))
    }

    /// Whether retrying the same operation later may succeed.
    ///
    /// Only I/O failures qualify; a file locked by another process or a
    /// half-written source is expected to clear up on its own.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
