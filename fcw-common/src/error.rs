//! Common error types for FCW

use thiserror::Error;

/// Common result type for FCW operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the FCW crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON/TOML encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
