//! Error types for pattern analysis

use thiserror::Error;

/// Errors that abort an analysis run
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyzeError {
    /// Analyzer configuration is unusable
    #[error("invalid analyzer configuration: {0}")]
    InvalidConfig(String),
}
