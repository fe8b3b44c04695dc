use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the ledger, its calculators and its stores.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid harvest method '{0}'; use 'manual' or 'mechanized'")]
    InvalidMethod(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("position {position} is out of range ({len} item(s) available)")]
    IndexOutOfRange { position: usize, len: usize },

    #[error("relational store unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("malformed ledger document {}: {source}", .path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "refusing to overwrite {}: it could not be read. Fix it and run 'load', or use 'save --force'",
        .0.display()
    )]
    UnreadableDocument(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Backend(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
