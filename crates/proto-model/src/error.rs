//! Error types for the protocol data model

use thiserror::Error;

/// Errors raised while interpreting model values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Encoding name not recognised
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
}
