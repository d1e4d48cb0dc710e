//! Pattern analysis (Passes 2 and 3)
//!
//! Splits a captured log into packages, segments and fields using the
//! Pass 1 [`DetectionResult`](proto_model::DetectionResult), classifies each
//! field position from byte patterns, and detects relationships between the
//! resulting fields.
//!
//! # Example
//!
//! ```rust
//! use proto_analyze::PatternAnalyzer;
//! use proto_detect::ProtocolDetector;
//!
//! let log = "ST,GS,+0001.94\r\n".repeat(10);
//! let detection = ProtocolDetector::new().detect(log.as_bytes());
//! let analysis = PatternAnalyzer::new()
//!     .analyze(log.as_bytes(), &detection)
//!     .unwrap();
//!
//! assert_eq!(analysis.fields.len(), 3);
//! assert_eq!(analysis.fields[2].name, "Gross");
//! ```

pub mod analyzer;
pub mod classify;
pub mod error;
pub mod extract;
pub mod relationship;

pub use analyzer::{AnalyzerConfig, PatternAnalyzer};
pub use classify::{classify_bytes, ByteClass, FieldClassifier};
pub use error::AnalyzeError;
pub use extract::{Package, PackageLayout};
pub use relationship::{Derivation, RelationshipConfig, RelationshipDetector};
