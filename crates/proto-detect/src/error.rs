//! Error types for protocol detection

use thiserror::Error;

/// Errors that stop detection from running
///
/// These never escape [`ProtocolDetector::detect`](crate::ProtocolDetector::detect),
/// which degrades them into a zero-confidence result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectError {
    /// Nothing to analyze
    #[error("input is empty")]
    EmptyInput,

    /// Input exceeds the configured limit
    #[error("input of {len} bytes exceeds limit of {limit} bytes")]
    InputTooLarge { len: usize, limit: usize },
}
