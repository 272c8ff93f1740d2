use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunwayError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfiguration(Vec<String>),

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
}
