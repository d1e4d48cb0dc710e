//! Relationships between fields
//!
//! Relationships are descriptive metadata. Nothing in the pipeline
//! evaluates them against live data.

/// Kind of relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelationshipType {
    /// One compound field splits into value and unit
    Split,
    /// Adjacent date and time fields form one timestamp
    Combine,
    /// One field is arithmetically derived from others
    Calculate,
}

/// A detected relationship between fields
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldRelationship {
    /// Kind of relationship
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub relationship_type: RelationshipType,
    /// Source field names, in order
    pub source_fields: Vec<String>,
    /// Target field name, if the relationship produces one
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub target_field: Option<String>,
    /// Description of the operation
    pub operation: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Numeric tolerance for calculated relationships
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub tolerance: Option<f64>,
}

impl FieldRelationship {
    /// Compound field split into `<name>Value` and `<name>Unit`
    pub fn split(source: &str, confidence: f64) -> Self {
        Self {
            relationship_type: RelationshipType::Split,
            source_fields: vec![source.to_string()],
            target_field: None,
            operation: format!("{source} → {source}Value + {source}Unit"),
            confidence,
            tolerance: None,
        }
    }

    /// Date and time fields combined into `target`
    pub fn combine(date: &str, time: &str, target: &str) -> Self {
        Self {
            relationship_type: RelationshipType::Combine,
            source_fields: vec![date.to_string(), time.to_string()],
            target_field: Some(target.to_string()),
            operation: "Date + Time".to_string(),
            confidence: 1.0,
            tolerance: None,
        }
    }

    /// Target computed from sources by `operation`
    pub fn calculate(
        sources: Vec<String>,
        target: &str,
        operation: &str,
        confidence: f64,
        tolerance: f64,
    ) -> Self {
        Self {
            relationship_type: RelationshipType::Calculate,
            source_fields: sources,
            target_field: Some(target.to_string()),
            operation: operation.to_string(),
            confidence,
            tolerance: Some(tolerance),
        }
    }
}
