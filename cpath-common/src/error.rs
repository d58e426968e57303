//! Common error types for cpath

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for cpath operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the cpath crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error on the root folder, database file or submissions log
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be resolved
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file exists but is not valid TOML for [`crate::config::TomlConfig`]
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
