//! Exported protocol definition
//!
//! This is the contract with the generic parser/serializer runtime.
//! With the `serde` feature it serializes to camel-cased JSON with
//! unset optional values omitted.

use crate::field::{Alignment, DataType, FieldAction, FieldType};
use crate::relationship::FieldRelationship;

/// Shape of one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageType {
    /// Each message is one line
    SingleLine,
    /// Several lines without frame markers
    MultiLineBlock,
    /// Several lines between start/end marker lines
    MultiLineFrame,
}

/// An exported field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldDefinition {
    pub order: usize,
    pub name: String,
    pub data_type: DataType,
    pub field_type: FieldType,
    pub sample_values: Vec<String>,
    pub confidence: f64,
    pub min_length: usize,
    pub max_length: usize,
    pub is_constant: bool,
    pub action: FieldAction,
    pub required: bool,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub parse_pattern: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub format_string: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub unit: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub alignment: Option<Alignment>,
}

impl FieldDefinition {
    /// Whether this field is a start/end/position marker
    pub fn is_marker(&self) -> bool {
        self.field_type.is_marker()
    }
}

/// Category of validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RuleType {
    /// Value must fall within observed bounds
    Range,
    /// Value must satisfy an arithmetic identity
    Formula,
    /// Value is constrained by a related field
    Relationship,
}

/// A validation rule attached to the definition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ValidationRule {
    pub rule_type: RuleType,
    pub field: String,
    pub description: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub min: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub max: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub expression: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub tolerance: Option<f64>,
}

/// The generated protocol definition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ProtocolDefinition {
    /// Device name
    pub device_name: String,
    /// Definition version
    pub version: String,
    /// Generation timestamp, when requested
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub generated_date: Option<String>,
    /// Encoding name (e.g. "ASCII")
    #[cfg_attr(feature = "serde", serde(rename = "encoding"))]
    pub encoding_name: String,
    /// Free-form description
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    /// Message shape
    pub message_type: MessageType,
    /// Escaped frame terminator (e.g. "\r\n")
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub entry_terminator: Option<String>,
    /// Regex matching the start marker line
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub frame_start: Option<String>,
    /// Regex matching the end marker line
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub frame_end: Option<String>,
    /// Exported fields, in order
    pub fields: Vec<FieldDefinition>,
    /// Detected relationships
    pub relationships: Vec<FieldRelationship>,
    /// Supplementary validation rules
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub validation_rules: Vec<ValidationRule>,
}
