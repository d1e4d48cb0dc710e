//! Pass 3 output

use crate::detection::ProtocolStructureClass;
use crate::encoding::EncodingProfile;
use crate::field::FieldInfo;
use crate::relationship::FieldRelationship;
use crate::terminator::{TerminatorCandidate, TerminatorHierarchy};

/// Protocol category exposed to the definition generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolType {
    /// One segment per message
    SingleSegment,
    /// Several segments per message
    MultiSegment,
    /// Control-character framed
    Binary,
    /// Not determined
    Unknown,
}

impl From<ProtocolStructureClass> for ProtocolType {
    fn from(structure: ProtocolStructureClass) -> Self {
        match structure {
            ProtocolStructureClass::FlatDelimited | ProtocolStructureClass::FlatFixedPosition => {
                ProtocolType::SingleSegment
            }
            ProtocolStructureClass::SegmentedDelimited
            | ProtocolStructureClass::SegmentedFixedPosition => ProtocolType::MultiSegment,
            ProtocolStructureClass::Binary => ProtocolType::Binary,
            ProtocolStructureClass::Unknown => ProtocolType::Unknown,
        }
    }
}

/// Literal bytes that open and close each package
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameMarkers {
    /// Bytes opening a package
    pub start: Option<Vec<u8>>,
    /// Bytes closing a package
    pub end: Option<Vec<u8>>,
}

impl FrameMarkers {
    /// Whether neither marker is known
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Everything Pass 3 learned about the log
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisResult {
    /// Number of packages extracted
    pub message_count: usize,
    /// Detected encoding
    pub encoding: EncodingProfile,
    /// Authoritative field delimiter, if any
    pub terminator: Option<TerminatorCandidate>,
    /// Pass 1 hierarchy
    pub hierarchy: TerminatorHierarchy,
    /// Pass 1 structure class
    pub structure: ProtocolStructureClass,
    /// Package markers used for extraction
    pub frame_markers: FrameMarkers,
    /// Classified fields, including derived ones
    pub fields: Vec<FieldInfo>,
    /// Detected relationships
    pub relationships: Vec<FieldRelationship>,
    /// Coarse protocol category
    pub protocol_type: ProtocolType,
    /// Aggregated confidence in [0, 1]
    pub confidence: f64,
    /// Human-readable parsing strategy
    pub suggested_strategy: String,
    /// Raw bytes of the first package, segment terminators included
    pub sample_message: Vec<u8>,
}
