//! Error types for Kartka.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for Kartka operations.
#[derive(Error, Debug)]
pub enum KartkaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid entry field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Duplicate ID: {0}")]
    DuplicateId(String),

    #[error("Speech synthesis failed for {text:?}: {message}")]
    Synthesis { text: String, message: String },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    UnlocatedIo(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Packaging failed: {0}")]
    Package(String),
}

impl KartkaError {
    /// Build a validation error for a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        KartkaError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KartkaError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for Kartka operations.
pub type Result<T> = std::result::Result<T, KartkaError>;
