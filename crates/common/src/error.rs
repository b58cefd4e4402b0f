//! Error types for qaflow

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using qaflow Error
pub type Result<T> = std::result::Result<T, Error>;

/// qaflow error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation kind: {0}")]
    UnsupportedOperationKind(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unsupported state: {0}")]
    UnsupportedState(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
