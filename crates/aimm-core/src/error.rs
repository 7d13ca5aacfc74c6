//! Error types for AIMM.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure talking to the backend.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Backend answered with a non-2xx status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Please select exactly two nodes to create a link (selected {0})")]
    SelectionSize(usize),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    #[error("Invalid graph snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
