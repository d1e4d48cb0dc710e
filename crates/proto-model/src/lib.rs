//! Protocol Inference Data Model
//!
//! Types shared by every pass of the protocol inference pipeline:
//!
//! - **Pass 1** produces a [`DetectionResult`]: encoding, terminator
//!   hierarchy and structure class
//! - **Pass 3** produces an [`AnalysisResult`]: classified fields and the
//!   relationships between them
//! - **Pass 4** produces a [`ProtocolDefinition`], the artifact exported for
//!   the generic parser/serializer runtime
//!
//! Enable the `serde` feature to serialize any of these types.

pub mod analysis;
pub mod definition;
pub mod detection;
pub mod encoding;
pub mod error;
pub mod field;
pub mod relationship;
pub mod terminator;

pub use analysis::{AnalysisResult, FrameMarkers, ProtocolType};
pub use definition::{
    FieldDefinition, MessageType, ProtocolDefinition, RuleType, ValidationRule,
};
pub use detection::{DetectionResult, ProtocolStructureClass};
pub use encoding::{decode, encode, EncodingKind, EncodingProfile};
pub use error::ModelError;
pub use field::{Alignment, DataType, FieldAction, FieldInfo, FieldType, MAX_SAMPLES};
pub use relationship::{FieldRelationship, RelationshipType};
pub use terminator::{TerminatorCandidate, TerminatorHierarchy, CONFIDENT_THRESHOLD};
