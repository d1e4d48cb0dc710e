//! Protocol structure detection (Pass 1)
//!
//! Detects the text encoding of a captured serial log, then the nested
//! terminator hierarchy (frame, segment, field delimiter) and a coarse
//! structure class.
//!
//! # Example
//!
//! ```rust
//! use proto_detect::ProtocolDetector;
//! use proto_model::ProtocolStructureClass;
//!
//! let log = "ST,GS,+0001.94kg\r\n".repeat(10);
//! let result = ProtocolDetector::new().detect(log.as_bytes());
//!
//! assert_eq!(result.structure, ProtocolStructureClass::FlatDelimited);
//! ```

pub mod delimiter;
pub mod detector;
pub mod encoding;
pub mod error;
pub mod terminator;

pub use delimiter::{DelimiterCandidate, DelimiterDetector};
pub use detector::{classify, overall_confidence, DetectorConfig, ProtocolDetector};
pub use encoding::EncodingDetector;
pub use error::DetectError;
pub use terminator::{TerminatorConfig, TerminatorDetector};
