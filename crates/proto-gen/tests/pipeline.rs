//! End-to-end tests for the inference pipeline
//!
//! Each test feeds a captured log through detection, analysis and
//! generation and checks the exported definition.

use proptest::prelude::*;
use proto_gen::{infer_definition, GeneratorConfig, PipelineConfig};
use proto_model::{
    encode, DataType, EncodingKind, FieldAction, FieldDefinition, FieldType, MessageType,
    ProtocolDefinition, RelationshipType,
};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Run the pipeline with default settings, panicking on error
    pub fn infer(data: &[u8]) -> proto_gen::GeneratedDefinition {
        infer_definition(data, &PipelineConfig::default()).unwrap()
    }

    /// Exported fields that carry data
    pub fn data_fields(definition: &ProtocolDefinition) -> Vec<&FieldDefinition> {
        definition
            .fields
            .iter()
            .filter(|f| f.field_type != FieldType::Empty)
            .collect()
    }

    pub fn field<'a>(definition: &'a ProtocolDefinition, name: &str) -> &'a FieldDefinition {
        definition
            .fields
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("no field named {name}"))
    }

    /// Hundredths as a fixed two-decimal string, e.g. 1207 -> "12.07"
    pub fn cents(value: u32) -> String {
        format!("{}.{:02}", value / 100, value % 100)
    }

    /// STX/ETX framed gross/tare/net printout with varying weights
    pub fn weighing_frames(count: u32) -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..count {
            let gross = 1200 + 7 * i;
            let net = gross - 50;
            let frame = format!(
                "\x02GROSS  {}\r\nTARE    0.50\r\nNET    {}\r\n\x03\r\n",
                cents(gross),
                cents(net)
            );
            data.extend_from_slice(frame.as_bytes());
        }
        data
    }
}

use helpers::*;

// ============================================================================
// Single-line scale output
// ============================================================================

mod single_line {
    use super::*;

    #[test]
    fn test_space_padded_scale_output() {
        let data = b"   0.360 kg    G\r\n".repeat(10);
        let generated = infer(&data);
        let definition = &generated.definition;

        assert!(generated.is_valid(), "errors: {:?}", generated.errors);
        assert_eq!(definition.encoding_name, "ASCII");
        assert_eq!(definition.message_type, MessageType::SingleLine);
        assert_eq!(definition.entry_terminator.as_deref(), Some("\\r\\n"));

        let fields = data_fields(definition);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].data_type, DataType::Float);
        assert_eq!(fields[0].sample_values[0], "0.360");
        assert_eq!(fields[1].field_type, FieldType::Unit);
        assert!(fields[1].is_constant);
        assert_eq!(fields[1].sample_values[0], "kg");
        assert_eq!(fields[2].data_type, DataType::String);
        assert_eq!(fields[2].sample_values[0], "G");
        assert_eq!(fields[0].unit.as_deref(), Some("kg"));
    }

    #[test]
    fn test_exported_orders_are_contiguous() {
        let data = b"   0.360 kg    G\r\n".repeat(10);
        let generated = infer(&data);
        for (i, field) in generated.definition.fields.iter().enumerate() {
            assert_eq!(field.order, i);
        }
    }

    #[test]
    fn test_csv_compound_weight_is_split() {
        let mut data = Vec::new();
        for i in 0..12u32 {
            data.extend_from_slice(format!("ST,GS,+0001.{:02}kg\r\n", 10 + i * 3).as_bytes());
        }
        let generated = infer(&data);
        let definition = &generated.definition;

        assert!(generated.is_valid(), "errors: {:?}", generated.errors);
        let names: Vec<&str> = definition.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Field1", "Field2", "Field3Value", "Field3Unit"]);

        let value = field(definition, "Field3Value");
        assert_eq!(value.data_type, DataType::Float);
        assert_eq!(value.sample_values[0], "+0001.10");
        assert_eq!(field(definition, "Field3Unit").sample_values[0], "kg");

        assert_eq!(definition.relationships.len(), 1);
        assert_eq!(
            definition.relationships[0].relationship_type,
            RelationshipType::Split
        );
        assert_eq!(definition.relationships[0].source_fields, vec!["Field3"]);
    }

    #[test]
    fn test_hash_terminated_readings() {
        let mut data = Vec::new();
        for i in 0..12u32 {
            data.extend_from_slice(format!("ST,GS,+0001.{:02}kg#", 10 + i * 3).as_bytes());
        }
        let generated = infer(&data);
        let definition = &generated.definition;

        assert!(generated.is_valid(), "errors: {:?}", generated.errors);
        assert_eq!(definition.message_type, MessageType::SingleLine);
        assert_eq!(definition.entry_terminator.as_deref(), Some("#"));
        let names: Vec<&str> = definition.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Field1", "Field2", "Field3Value", "Field3Unit"]);
        assert_eq!(field(definition, "Field3Unit").sample_values[0], "kg");
    }

    #[test]
    fn test_utf16le_log_with_bom() {
        let mut data = vec![0xFF, 0xFE];
        for i in 1..=12u32 {
            data.extend(encode(EncodingKind::Utf16Le, &format!("A,{},{}\r\n", i, i * 2)));
        }
        let generated = infer(&data);
        let definition = &generated.definition;

        assert_eq!(definition.encoding_name, "UTF-16LE");
        assert_eq!(definition.entry_terminator.as_deref(), Some("\\r\\n"));
        assert_eq!(definition.fields.len(), 3);
        assert_eq!(definition.fields[0].sample_values[0], "A");
        assert_eq!(definition.fields[1].data_type, DataType::Integer);
        assert_eq!(definition.fields[2].sample_values[0], "2");
    }
}

// ============================================================================
// Multi-line frames
// ============================================================================

mod multi_line {
    use super::*;

    #[test]
    fn test_stx_etx_frames_export_as_multi_line_frame() {
        let generated = infer(&weighing_frames(10));
        let definition = &generated.definition;

        assert!(generated.is_valid(), "errors: {:?}", generated.errors);
        assert_eq!(definition.message_type, MessageType::MultiLineFrame);
        assert_eq!(definition.frame_start.as_deref(), Some("^\u{2}"));
        assert_eq!(
            definition.entry_terminator.as_deref(),
            Some("\\u0003\\r\\n")
        );

        for name in ["Gross", "Tare", "Net"] {
            let f = field(definition, name);
            assert_eq!(f.data_type, DataType::Float);
            assert_eq!(f.action, FieldAction::Parse);
        }
        assert_eq!(field(definition, "Gross").sample_values[0], "12.00");
    }

    #[test]
    fn test_labels_are_not_exported() {
        let generated = infer(&weighing_frames(10));
        assert!(generated
            .definition
            .fields
            .iter()
            .all(|f| f.field_type != FieldType::Label));
    }

    #[test]
    fn test_net_weight_formula_is_detected() {
        let generated = infer(&weighing_frames(10));
        let definition = &generated.definition;

        let calculate = definition
            .relationships
            .iter()
            .find(|r| r.relationship_type == RelationshipType::Calculate)
            .expect("net weight relationship");
        assert_eq!(calculate.target_field.as_deref(), Some("Net"));
        assert_eq!(calculate.source_fields, vec!["Gross", "Tare"]);
        assert_eq!(calculate.operation, "Gross − Tare");

        assert!(definition
            .validation_rules
            .iter()
            .any(|r| r.field == "Net" && r.expression.as_deref() == Some("Net = Gross - Tare")));
    }

    #[test]
    fn test_validation_rules_can_be_disabled() {
        let config = PipelineConfig {
            generator: GeneratorConfig {
                validation_rules: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let generated = infer_definition(&weighing_frames(10), &config).unwrap();
        assert!(generated.definition.validation_rules.is_empty());
        assert!(!generated.definition.relationships.is_empty());
    }
}

// ============================================================================
// JSON export
// ============================================================================

mod export {
    use super::*;

    #[test]
    fn test_json_shape() {
        let config = PipelineConfig {
            generator: GeneratorConfig {
                device_name: "BenchScale".to_string(),
                version: "2.1".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let generated = infer_definition(&b"   0.360 kg    G\r\n".repeat(10), &config).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&generated.to_json().unwrap()).unwrap();

        assert_eq!(json["deviceName"], "BenchScale");
        assert_eq!(json["version"], "2.1");
        assert_eq!(json["encoding"], "ASCII");
        assert_eq!(json["messageType"], "SingleLine");
        assert_eq!(json["entryTerminator"], "\\r\\n");
        assert!(json.get("generatedDate").is_none());
        assert!(json.get("frameStart").is_none());
        assert!(json["fields"].is_array());
        assert!(json["relationships"].is_array());
        assert!(json["fields"][0].get("dataType").is_some());
    }

    #[test]
    fn test_generated_date_is_written_when_set() {
        let config = PipelineConfig {
            generator: GeneratorConfig {
                generated_date: Some("2026-10-19T00:00:00Z".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let generated = infer_definition(&b"12,34\r\n".repeat(10), &config).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&generated.to_json().unwrap()).unwrap();
        assert_eq!(json["generatedDate"], "2026-10-19T00:00:00Z");
    }

    #[test]
    fn test_write_json_round_trips() {
        let path = std::env::temp_dir().join(format!(
            "protoscope-pipeline-{}.json",
            std::process::id()
        ));
        let generated = infer(&b"12,34\r\n".repeat(10));
        generated.write_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(text.ends_with('\n'));
        let parsed: ProtocolDefinition = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, generated.definition);
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_pipeline_is_idempotent(weights in prop::collection::vec(0u32..100_000, 6..20)) {
        let mut data = Vec::new();
        for w in &weights {
            data.extend_from_slice(
                format!("ST,GS,+{:04}.{:02}kg\r\n", w / 100, w % 100).as_bytes(),
            );
        }
        let first = infer(&data).to_json().unwrap();
        let second = infer(&data).to_json().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_exported_fields_are_never_skipped_unless_empty(
        weights in prop::collection::vec(1000u32..2000, 6..20)
    ) {
        let mut data = Vec::new();
        for w in &weights {
            data.extend_from_slice(format!("N,{}\r\n", cents(*w)).as_bytes());
        }
        let generated = infer(&data);
        for f in &generated.definition.fields {
            prop_assert!(f.action != FieldAction::Skip || f.field_type == FieldType::Empty);
        }
    }
}
