//! Pass 3: extraction, classification and relationships into an
//! [`AnalysisResult`]

use proto_detect::DelimiterDetector;
use proto_model::{
    AnalysisResult, DetectionResult, EncodingKind, FieldInfo, FrameMarkers, ProtocolType,
    TerminatorCandidate, TerminatorHierarchy,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::FieldClassifier;
use crate::error::AnalyzeError;
use crate::extract::{self, Package};
use crate::relationship::{RelationshipConfig, RelationshipDetector};

/// Pattern analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Packages sampled for classification
    pub max_sample_packages: usize,
    /// Share of samples a type needs to win the majority vote
    pub majority_threshold: f64,
    /// Minimum confidence of the detected field delimiter before falling
    /// back to the simple delimiter detector
    pub delimiter_confidence_threshold: f64,
    /// Package start marker, overriding detection
    pub start_marker: Option<Vec<u8>>,
    /// Package end marker, overriding detection
    pub end_marker: Option<Vec<u8>>,
    pub relationships: RelationshipConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_sample_packages: 10,
            majority_threshold: 0.8,
            delimiter_confidence_threshold: 0.5,
            start_marker: None,
            end_marker: None,
            relationships: RelationshipConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Reject configurations the analyzer cannot run with
    pub fn validate(&self) -> Result<(), AnalyzeError> {
        if self.max_sample_packages == 0 {
            return Err(AnalyzeError::InvalidConfig(
                "max_sample_packages must be at least 1".to_string(),
            ));
        }
        let ratios = [
            ("majority_threshold", self.majority_threshold),
            ("delimiter_confidence_threshold", self.delimiter_confidence_threshold),
            ("relationships.match_threshold", self.relationships.match_threshold),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalyzeError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.relationships.formula_tolerance < 0.0 {
            return Err(AnalyzeError::InvalidConfig(
                "relationships.formula_tolerance must not be negative".to_string(),
            ));
        }
        let empty_marker = |m: &Option<Vec<u8>>| m.as_ref().is_some_and(Vec::is_empty);
        if empty_marker(&self.start_marker) || empty_marker(&self.end_marker) {
            return Err(AnalyzeError::InvalidConfig(
                "frame marker overrides must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ties extraction, classification and relationship detection together
#[derive(Debug, Clone, Default)]
pub struct PatternAnalyzer {
    config: AnalyzerConfig,
}

impl PatternAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Analyze a raw buffer using the Pass 1 result
    pub fn analyze(
        &self,
        data: &[u8],
        detection: &DetectionResult,
    ) -> Result<AnalysisResult, AnalyzeError> {
        self.config.validate()?;

        let body = &data[detection.encoding.bom_length.min(data.len())..];
        let markers = self.markers(&detection.hierarchy);
        let packages = extract::split_packages(body, &markers);
        debug!(
            "Extracted {} packages (start={:02X?}, end={:02X?})",
            packages.len(),
            markers.start,
            markers.end
        );

        Ok(self.analyze_packages(&packages, markers, detection))
    }

    /// Analyze pre-segmented log entries, one package each
    pub fn analyze_entries(
        &self,
        entries: &[&[u8]],
        detection: &DetectionResult,
    ) -> Result<AnalysisResult, AnalyzeError> {
        self.config.validate()?;

        let packages: Vec<Package<'_>> = entries
            .iter()
            .filter(|e| !e.is_empty())
            .enumerate()
            .map(|(index, &bytes)| Package { index, bytes })
            .collect();

        Ok(self.analyze_packages(&packages, FrameMarkers::default(), detection))
    }

    fn markers(&self, hierarchy: &TerminatorHierarchy) -> FrameMarkers {
        let detected = extract::frame_markers(hierarchy);
        if self.config.start_marker.is_none() && self.config.end_marker.is_none() {
            return detected;
        }
        FrameMarkers {
            start: self.config.start_marker.clone(),
            end: self.config.end_marker.clone(),
        }
    }

    fn analyze_packages(
        &self,
        packages: &[Package<'_>],
        frame_markers: FrameMarkers,
        detection: &DetectionResult,
    ) -> AnalysisResult {
        let encoding = detection.encoding.kind;
        let hierarchy = &detection.hierarchy;
        let segment = hierarchy.distinct_segment().map(|s| s.bytes.as_slice());
        let sampled = &packages[..packages.len().min(self.config.max_sample_packages)];

        let terminator = self.field_delimiter(hierarchy, sampled, segment, encoding);
        let delimiter = terminator.as_ref().map(|t| t.bytes.as_slice());

        let layouts: Vec<_> = sampled
            .iter()
            .map(|p| extract::layout(p, segment, delimiter))
            .collect();
        let fields =
            FieldClassifier::new(encoding, self.config.majority_threshold).classify(&layouts);

        let derivation = RelationshipDetector::with_config(self.config.relationships.clone())
            .detect(&fields, encoding);
        let mut fields = derivation.apply(fields);
        fields.sort_by_key(|f| f.order);

        let protocol_type = ProtocolType::from(detection.structure);
        let confidence =
            0.7 * detection.overall_confidence + 0.3 * mean_field_confidence(&fields) / 100.0;
        let suggested_strategy = strategy(detection, segment.is_some(), terminator.as_ref());

        info!(
            "Analyzed {} packages: {} fields, {} relationships, confidence {:.2}",
            packages.len(),
            fields.len(),
            derivation.relationships.len(),
            confidence
        );

        AnalysisResult {
            message_count: packages.len(),
            encoding: detection.encoding.clone(),
            terminator,
            hierarchy: hierarchy.clone(),
            structure: detection.structure,
            frame_markers,
            fields,
            relationships: derivation.relationships,
            protocol_type,
            confidence: confidence.clamp(0.0, 1.0),
            suggested_strategy,
            sample_message: packages.first().map(|p| p.bytes.to_vec()).unwrap_or_default(),
        }
    }

    /// Authoritative field delimiter
    ///
    /// The detected one when confident enough, else the best simple
    /// delimiter across sampled segments, else none.
    fn field_delimiter(
        &self,
        hierarchy: &TerminatorHierarchy,
        sampled: &[Package<'_>],
        segment: Option<&[u8]>,
        encoding: EncodingKind,
    ) -> Option<TerminatorCandidate> {
        if let Some(field) = hierarchy
            .field_delimiter
            .as_ref()
            .filter(|f| f.confidence >= self.config.delimiter_confidence_threshold)
        {
            return Some(field.clone());
        }

        let segments: Vec<&[u8]> = sampled
            .iter()
            .flat_map(|p| extract::split_segments(p.bytes, segment))
            .collect();
        let fallback = DelimiterDetector::new().detect(&segments, encoding);
        if let Some(d) = &fallback {
            debug!("Falling back to delimiter {:?}", d.delimiter);
        }
        fallback.map(|d| d.to_terminator())
    }
}

fn mean_field_confidence(fields: &[FieldInfo]) -> f64 {
    if fields.is_empty() {
        0.0
    } else {
        fields.iter().map(|f| f.confidence).sum::<f64>() / fields.len() as f64
    }
}

/// e.g. "Multi-segment delimited (segments by CRLF, fields by ',')"
fn strategy(
    detection: &DetectionResult,
    segmented: bool,
    delimiter: Option<&TerminatorCandidate>,
) -> String {
    let mut parts = Vec::new();
    if let Some(start) = &detection.hierarchy.frame_start {
        parts.push(format!("frames start with {}", start.display_name));
    }
    if let Some(frame) = &detection.hierarchy.frame {
        if segmented {
            parts.push(format!("frames by {}", frame.display_name));
        }
    }
    if segmented {
        if let Some(segment) = &detection.hierarchy.segment {
            parts.push(format!("segments by {}", segment.display_name));
        }
    } else if let Some(frame) = &detection.hierarchy.frame {
        parts.push(format!("messages by {}", frame.display_name));
    }
    match delimiter {
        Some(d) => parts.push(format!("fields by {}", d.display_name)),
        None => parts.push("fields by position".to_string()),
    }
    format!("{} ({})", detection.structure.label(), parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proto_detect::ProtocolDetector;
    use proto_model::{DataType, FieldAction, FieldType, ProtocolStructureClass};

    fn run(data: &[u8]) -> AnalysisResult {
        let detection = ProtocolDetector::new().detect(data);
        PatternAnalyzer::new().analyze(data, &detection).unwrap()
    }

    #[test]
    fn test_csv_weight_log() {
        let data = b"ST,GS,+0001.94kg\r\n".repeat(12);
        let result = run(&data);

        assert_eq!(result.message_count, 12);
        assert_eq!(result.protocol_type, ProtocolType::SingleSegment);
        assert_eq!(result.terminator.as_ref().unwrap().bytes, b",");
        let names: Vec<&str> = result.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Field1", "Field2", "Field3", "Field3Value", "Field3Unit"]
        );
        assert_eq!(result.fields[0].data_type, DataType::String);
        assert_eq!(result.fields[3].sample_values[0], b"+0001.94");
        assert_eq!(result.sample_message, b"ST,GS,+0001.94kg");
        assert_eq!(
            result.suggested_strategy,
            "Single-segment delimited (messages by CRLF, fields by ',')"
        );
    }

    #[test]
    fn test_space_padded_scale_output() {
        let data = b"   0.360 kg    G\r\n".repeat(10);
        let result = run(&data);

        let data_fields: Vec<&FieldInfo> = result
            .fields
            .iter()
            .filter(|f| f.field_type != FieldType::Empty)
            .collect();
        assert_eq!(data_fields.len(), 3);
        assert_eq!(data_fields[0].data_type, DataType::Float);
        assert_eq!(data_fields[0].sample_values[0], b"0.360");
        assert_eq!(data_fields[1].field_type, FieldType::Unit);
        assert!(data_fields[1].is_constant);
        assert_eq!(data_fields[2].data_type, DataType::String);
        assert!(data_fields[2].variance <= 0.1);
    }

    #[test]
    fn test_compound_fields_are_split_in_place() {
        let data = b"N,1.94 kg\r\nN,1.95 kg\r\nN,2.00 kg\r\nN,2.10 kg\r\nN,2.20 kg\r\n".repeat(2);
        let result = run(&data);

        let names: Vec<&str> = result.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Field1", "Field2", "Field2Value", "Field2Unit"]);
        assert_eq!(result.fields[1].action, FieldAction::Skip);
        assert_eq!(result.relationships.len(), 1);
    }

    #[test]
    fn test_entries_without_markers() {
        let detection = ProtocolDetector::new().detect(b"A;1;2\nB;3;4\nC;5;6\nD;7;8\nE;9;0\n");
        let entries: Vec<&[u8]> = vec![b"A;1;2", b"B;3;4", b"", b"C;5;6"];
        let result = PatternAnalyzer::new()
            .analyze_entries(&entries, &detection)
            .unwrap();
        assert_eq!(result.message_count, 3);
        assert!(result.frame_markers.is_empty());
        assert_eq!(result.fields.len(), 3);
        assert_eq!(result.fields[1].data_type, DataType::Integer);
    }

    #[test]
    fn test_marker_override() {
        let data = b"#W1*#W2*#W3*".to_vec();
        let detection = ProtocolDetector::new().detect(&data);
        let analyzer = PatternAnalyzer::with_config(AnalyzerConfig {
            start_marker: Some(b"#".to_vec()),
            end_marker: Some(b"*".to_vec()),
            ..Default::default()
        });
        let result = analyzer.analyze(&data, &detection).unwrap();
        assert_eq!(result.message_count, 3);
        assert_eq!(result.sample_message, b"W1");
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let detection = DetectionResult::degraded("test");
        let analyzer = PatternAnalyzer::with_config(AnalyzerConfig {
            max_sample_packages: 0,
            ..Default::default()
        });
        assert!(matches!(
            analyzer.analyze(b"x", &detection),
            Err(AnalyzeError::InvalidConfig(_))
        ));

        let analyzer = PatternAnalyzer::with_config(AnalyzerConfig {
            majority_threshold: 1.5,
            ..Default::default()
        });
        assert!(analyzer.analyze(b"x", &detection).is_err());
    }

    #[test]
    fn test_confidence_combines_passes() {
        let data = b"12,34\r\n".repeat(10);
        let detection = ProtocolDetector::new().detect(&data);
        let result = PatternAnalyzer::new().analyze(&data, &detection).unwrap();
        let expected = 0.7 * detection.overall_confidence + 0.3;
        assert!((result.confidence - expected).abs() < 1e-9);
        assert_eq!(result.structure, ProtocolStructureClass::FlatDelimited);
    }
}
