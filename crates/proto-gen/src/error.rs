//! Error types for definition generation and export

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    /// Definition could not be serialized
    #[error("failed to serialize definition: {0}")]
    Json(#[from] serde_json::Error),

    /// Definition could not be written
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Analysis could not run
    #[error(transparent)]
    Analyze(#[from] proto_analyze::AnalyzeError),
}
