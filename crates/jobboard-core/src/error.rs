//! Errors raised while loading settings and decoding stored data.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Settings are present but unusable, e.g. an empty API URL.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed settings file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),
}
