use std::path::PathBuf;

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Error during file I/O operations
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization
    #[error("json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    /// Error when user input fails.
    #[error("inquire error: {0}")]
    Inquire(#[from] inquire::InquireError),
    /// Error when git or ssh-keygen exits non-zero or cannot be spawned
    #[error("external tool failed: {0}")]
    ExternalTool(String),
    /// Error when a profile id or alias is unknown
    #[error("profile not found: '{0}'")]
    NotFound(String),
    /// Error when key material already exists where a new key would be written
    #[error("SSH key already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    /// Error when a private key is required but absent on disk
    #[error("SSH key not found: {}. Generate it first.", .0.display())]
    KeyMissing(PathBuf),
    /// Error during input validation.
    #[error("validation error: {0}")]
    Validation(String),
    /// Error when resolving directories or settings
    #[error("configuration error: {0}")]
    Config(String),
    /// Error during UTF-8 conversion.
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}
