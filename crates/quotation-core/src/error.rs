//! Unified Error Model
use std::path::PathBuf;
use thiserror::Error;

/// Structural problems in caller-supplied records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("VALIDATION/missing field `{0}`")]
    MissingField(String),

    #[error("VALIDATION/invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("VALIDATION/expected {expected} at `{path}`")]
    UnexpectedShape { path: String, expected: &'static str },
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Field path the error refers to.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField(field) => field,
            Self::InvalidField { field, .. } => field,
            Self::UnexpectedShape { path, .. } => path,
        }
    }
}

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("STORE/CORRUPT {}: {reason}", path.display())]
    StorageCorrupt { path: PathBuf, reason: String },

    #[error("STORE/READ {}: {source}", path.display())]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("STORE/WRITE {}: {source}", path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("STORE/LOCK counter store mutex poisoned")]
    LockPoisoned,

    #[error("SERIALIZE/{0}")]
    Serialize(String),
}

pub type Result<T, E = QuoteError> = std::result::Result<T, E>;
