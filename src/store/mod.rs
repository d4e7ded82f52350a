pub mod models;
pub mod service;

use std::path::PathBuf;

use thiserror::Error;

pub use models::*;
pub use service::SessionStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access session file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Session file {} is malformed: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to encode sessions: {0}")]
    Encode(#[source] serde_json::Error),
}
