use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index document unavailable at {path:?}: {source}")]
    DocumentUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Index document at {path:?} is malformed: {source}")]
    DocumentMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode index document: {0}")]
    EncodingFailed(#[source] serde_json::Error),

    #[error("Failed to store index document at {path:?}: {source}")]
    StorageFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
