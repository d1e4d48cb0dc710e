//! Pass 1 output

use crate::encoding::{EncodingKind, EncodingProfile};
use crate::terminator::TerminatorHierarchy;

/// Coarse structural category of a protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolStructureClass {
    /// One segment per frame, fields split by a delimiter
    FlatDelimited,
    /// One segment per frame, fields at fixed positions
    FlatFixedPosition,
    /// Several segments per frame, fields split by a delimiter
    SegmentedDelimited,
    /// Several segments per frame, fields at fixed positions
    SegmentedFixedPosition,
    /// Control-character framed
    Binary,
    /// Detection failed
    Unknown,
}

impl ProtocolStructureClass {
    /// Short description used in strategy labels
    pub fn label(&self) -> &'static str {
        match self {
            Self::FlatDelimited => "Single-segment delimited",
            Self::FlatFixedPosition => "Single-segment fixed-position",
            Self::SegmentedDelimited => "Multi-segment delimited",
            Self::SegmentedFixedPosition => "Multi-segment fixed-position",
            Self::Binary => "Binary framed",
            Self::Unknown => "Unknown structure",
        }
    }
}

/// Encoding, terminator hierarchy and structure detected in Pass 1
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectionResult {
    /// Detected encoding
    pub encoding: EncodingProfile,
    /// Detected terminator levels
    pub hierarchy: TerminatorHierarchy,
    /// Structural category
    pub structure: ProtocolStructureClass,
    /// Mean confidence of the encoding and every present level
    pub overall_confidence: f64,
}

impl DetectionResult {
    /// Result used when detection could not run
    pub fn degraded(rationale: impl Into<String>) -> Self {
        Self {
            encoding: EncodingProfile::new(EncodingKind::Ascii, 0.0, rationale),
            hierarchy: TerminatorHierarchy::default(),
            structure: ProtocolStructureClass::Unknown,
            overall_confidence: 0.0,
        }
    }
}
