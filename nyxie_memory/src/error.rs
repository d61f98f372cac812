use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MemoryError>;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),

    #[error("failed to read record {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt record {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("record {} has version {found}, newest supported is {supported}", .path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("failed to write record {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode record for {user_id}: {source}")]
    Encode {
        user_id: String,
        source: serde_json::Error,
    },
}
