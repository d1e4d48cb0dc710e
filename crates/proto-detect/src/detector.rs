//! Pass 1: encoding, terminator hierarchy and structure class

use proto_model::terminator::{ETX, RS, STX, US};
use proto_model::{
    DetectionResult, EncodingKind, EncodingProfile, ProtocolStructureClass, TerminatorHierarchy,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::encoding::EncodingDetector;
use crate::error::DetectError;
use crate::terminator::{TerminatorConfig, TerminatorDetector};

/// Control bytes that mark a frame terminator as binary framing
pub const BINARY_FRAME_BYTES: [u8; 4] = [STX, ETX, RS, US];

/// Protocol detector configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    /// Inputs larger than this are rejected
    pub max_input_bytes: usize,
    /// Skip encoding detection and use this encoding
    pub encoding: Option<EncodingKind>,
    /// Terminator scan parameters
    pub terminator: TerminatorConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 64 * 1024 * 1024,
            encoding: None,
            terminator: TerminatorConfig::default(),
        }
    }
}

/// Runs encoding detection, then terminator detection, then classification
#[derive(Debug, Clone, Default)]
pub struct ProtocolDetector {
    config: DetectorConfig,
}

impl ProtocolDetector {
    /// Create a detector with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom configuration
    pub fn with_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect, degrading any failure to a zero-confidence `Unknown` result
    pub fn detect(&self, data: &[u8]) -> DetectionResult {
        match self.try_detect(data) {
            Ok(result) => result,
            Err(e) => {
                warn!("Protocol detection failed: {}", e);
                DetectionResult::degraded(e.to_string())
            }
        }
    }

    /// Detect, reporting why detection could not run
    pub fn try_detect(&self, data: &[u8]) -> Result<DetectionResult, DetectError> {
        if data.is_empty() {
            return Err(DetectError::EmptyInput);
        }
        if data.len() > self.config.max_input_bytes {
            return Err(DetectError::InputTooLarge {
                len: data.len(),
                limit: self.config.max_input_bytes,
            });
        }

        let encoding = match self.config.encoding {
            Some(kind) => {
                let bom_length = kind
                    .bom()
                    .filter(|bom| data.starts_with(bom))
                    .map_or(0, <[u8]>::len);
                EncodingProfile {
                    bom_length,
                    ..EncodingProfile::new(kind, 1.0, "configured")
                }
            }
            None => EncodingDetector::new().detect(data),
        };
        debug!(
            "Encoding {} ({:.2}): {}",
            encoding.kind, encoding.confidence, encoding.rationale
        );

        let body = &data[encoding.bom_length.min(data.len())..];
        let hierarchy = TerminatorDetector::with_config(self.config.terminator.clone())
            .detect(body, encoding.kind);
        let structure = classify(&hierarchy);
        let overall_confidence = overall_confidence(&encoding, &hierarchy);

        info!(
            "Detected {} structure, {} encoding, confidence {:.2}",
            structure.label(),
            encoding.kind,
            overall_confidence
        );

        Ok(DetectionResult {
            encoding,
            hierarchy,
            structure,
            overall_confidence,
        })
    }
}

/// Derive the structure class from the hierarchy
pub fn classify(hierarchy: &TerminatorHierarchy) -> ProtocolStructureClass {
    let binary_frame = hierarchy
        .frame
        .as_ref()
        .and_then(|f| f.bytes.first())
        .is_some_and(|b| BINARY_FRAME_BYTES.contains(b));
    if binary_frame {
        return ProtocolStructureClass::Binary;
    }

    match (
        hierarchy.distinct_segment().is_some(),
        hierarchy.confident_field_delimiter().is_some(),
    ) {
        (true, true) => ProtocolStructureClass::SegmentedDelimited,
        (true, false) => ProtocolStructureClass::SegmentedFixedPosition,
        (false, true) => ProtocolStructureClass::FlatDelimited,
        (false, false) => ProtocolStructureClass::FlatFixedPosition,
    }
}

/// Mean of the encoding confidence and every present level's confidence
pub fn overall_confidence(encoding: &EncodingProfile, hierarchy: &TerminatorHierarchy) -> f64 {
    let (sum, count) = hierarchy
        .present_levels()
        .fold((encoding.confidence, 1usize), |(sum, n), level| {
            (sum + level.confidence, n + 1)
        });
    sum / count as f64
}
