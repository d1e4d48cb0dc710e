//! Pass 4: protocol definition generation

use std::path::Path;

use proto_model::terminator::escape_text;
use proto_model::{
    decode, AnalysisResult, EncodingKind, FieldAction, FieldDefinition, FieldInfo, FieldType,
    MessageType, ProtocolDefinition,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::GenError;
use crate::markers::derive_marker_pattern;
use crate::rules::generate_rules;
use crate::validate::{validate, IdentifierPolicy};

/// Definition metadata and export options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub device_name: String,
    pub version: String,
    pub description: Option<String>,
    /// Timestamp written to `generatedDate`; omitted when unset
    pub generated_date: Option<String>,
    pub identifiers: IdentifierPolicy,
    /// Emit `validationRules`
    pub validation_rules: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            device_name: "UnknownDevice".to_string(),
            version: "1.0".to_string(),
            description: None,
            generated_date: None,
            identifiers: IdentifierPolicy::default(),
            validation_rules: true,
        }
    }
}

/// A definition together with its validation problems
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDefinition {
    pub definition: ProtocolDefinition,
    pub errors: Vec<String>,
}

impl GeneratedDefinition {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Indented camelCase JSON
    pub fn to_json(&self) -> Result<String, GenError> {
        Ok(serde_json::to_string_pretty(&self.definition)?)
    }

    /// Write the JSON export to `path`
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), GenError> {
        let path = path.as_ref();
        let mut json = self.to_json()?;
        json.push('\n');
        std::fs::write(path, json).map_err(|source| GenError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Whether a field belongs in the exported definition
///
/// Empty and marker fields always do; otherwise Validate'd units and any
/// Parse field, unless the field was retired.
pub fn is_exported(field: &FieldInfo) -> bool {
    if field.field_type == FieldType::Empty || field.is_marker() {
        return true;
    }
    if !field.include_in_definition {
        return false;
    }
    match field.action {
        FieldAction::Parse => true,
        FieldAction::Validate => field.field_type == FieldType::Unit,
        FieldAction::Skip => false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProtocolDefinitionGenerator {
    config: GeneratorConfig,
}

impl ProtocolDefinitionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Build and validate a definition from an analysis
    pub fn generate(&self, analysis: &AnalysisResult) -> GeneratedDefinition {
        let encoding = analysis.encoding.kind;
        let fields: Vec<FieldDefinition> = analysis
            .fields
            .iter()
            .filter(|f| is_exported(f))
            .enumerate()
            .map(|(order, f)| field_definition(order, f, encoding))
            .collect();
        debug!(
            "Exporting {} of {} fields",
            fields.len(),
            analysis.fields.len()
        );

        let message_type = message_type(analysis, &fields);
        let (frame_start, frame_end) = match message_type {
            MessageType::MultiLineFrame => frame_patterns(analysis, &fields),
            _ => (None, None),
        };

        let validation_rules = if self.config.validation_rules {
            generate_rules(&fields, &analysis.relationships)
        } else {
            Vec::new()
        };

        let definition = ProtocolDefinition {
            device_name: self.config.device_name.clone(),
            version: self.config.version.clone(),
            generated_date: self.config.generated_date.clone(),
            encoding_name: encoding.name().to_string(),
            description: self.config.description.clone(),
            message_type,
            entry_terminator: analysis
                .frame_markers
                .end
                .as_deref()
                .map(|end| escape_text(&decode(encoding, end))),
            frame_start,
            frame_end,
            fields,
            relationships: analysis.relationships.clone(),
            validation_rules,
        };

        let errors = validate(&definition, &self.config.identifiers);
        for e in &errors {
            warn!("Definition problem: {}", e);
        }
        info!(
            "Generated {:?} definition for {} with {} fields",
            definition.message_type,
            definition.device_name,
            definition.fields.len()
        );

        GeneratedDefinition { definition, errors }
    }
}

fn field_definition(order: usize, f: &FieldInfo, encoding: EncodingKind) -> FieldDefinition {
    FieldDefinition {
        order,
        name: f.name.clone(),
        data_type: f.data_type,
        field_type: f.field_type,
        sample_values: f.sample_values.iter().map(|s| decode(encoding, s)).collect(),
        confidence: f.confidence,
        min_length: f.min_length,
        max_length: f.max_length,
        is_constant: f.is_constant,
        action: f.action,
        required: f.required,
        parse_pattern: f.parse_pattern.clone(),
        format_string: f.format_string.clone(),
        unit: f.unit.clone(),
        alignment: f.alignment,
    }
}

/// Single line, multi-line block, or multi-line frame
///
/// A sample spanning several lines is a frame when it has start/end
/// marker fields or a start marker.
fn message_type(analysis: &AnalysisResult, fields: &[FieldDefinition]) -> MessageType {
    let text = decode(analysis.encoding.kind, &analysis.sample_message);
    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    if lines <= 1 {
        return MessageType::SingleLine;
    }

    let has_marker_fields = fields
        .iter()
        .any(|f| matches!(f.field_type, FieldType::StartMarker | FieldType::EndMarker));
    if has_marker_fields || analysis.frame_markers.start.is_some() {
        MessageType::MultiLineFrame
    } else {
        MessageType::MultiLineBlock
    }
}

fn frame_patterns(
    analysis: &AnalysisResult,
    fields: &[FieldDefinition],
) -> (Option<String>, Option<String>) {
    let marker_pattern = |tag: FieldType| {
        fields
            .iter()
            .find(|f| f.field_type == tag)
            .and_then(|f| {
                let samples: Vec<String> =
                    f.sample_values.iter().map(|s| s.trim().to_string()).collect();
                derive_marker_pattern(&samples)
            })
    };

    let start = marker_pattern(FieldType::StartMarker).or_else(|| {
        analysis
            .frame_markers
            .start
            .as_deref()
            .map(|s| format!("^{}", regex::escape(&decode(analysis.encoding.kind, s))))
    });
    (start, marker_pattern(FieldType::EndMarker))
}
