//! Error type shared by the Mealbox crates
//!
//! Covers the local concerns only (store, config, blob encoding). Remote
//! service failures belong to the storefront's own error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// SQLite access failed
    #[error("Store database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored blob is not valid JSON for the requested type
    #[error("Stored value could not be decoded: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Root folder or log file could not be created or opened
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid TOML or out-of-range setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store refused the write
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
