//! Field descriptions produced by classification

/// Data type of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// Whole number
    Integer,
    /// Decimal number
    Float,
    /// Date, time, or combined date and time
    DateTime,
    /// Free text
    String,
    /// Hexadecimal digits
    Hex,
    /// Non-printable bytes
    Binary,
}

impl DataType {
    /// Whether values of this type are numbers
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

/// Structural role of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldType {
    /// Literal line opening a multi-line frame
    StartMarker,
    /// Literal line closing a multi-line frame
    EndMarker,
    /// Constant punctuation with no alphanumerics
    Marker,
    /// Position that is always empty
    Empty,
    /// Constant zero filler
    Reserved,
    /// Whole number
    Integer,
    /// Decimal number
    Decimal,
    /// Calendar date
    Date,
    /// Time of day
    Time,
    /// Free text
    Text,
    /// Hexadecimal digits
    Hex,
    /// Non-printable bytes
    Binary,
    /// Constant unit suffix of a numeric field
    Unit,
    /// Constant label naming the following field
    Label,
}

impl FieldType {
    /// Whether this tag identifies a frame or position marker
    pub fn is_marker(&self) -> bool {
        matches!(
            self,
            FieldType::StartMarker | FieldType::EndMarker | FieldType::Marker
        )
    }
}

/// What the downstream runtime should do with a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldAction {
    /// Extract the value
    Parse,
    /// Check the value against the expected literal
    Validate,
    /// Ignore the value
    Skip,
}

/// Padding side observed in raw samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alignment {
    /// Padding follows the value
    Left,
    /// Padding precedes the value
    Right,
}

/// Maximum number of raw samples retained per field
pub const MAX_SAMPLES: usize = 10;

/// A field inferred from sampled packages
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldInfo {
    /// Position of the field within a package
    pub order: usize,
    /// Identifier
    pub name: String,
    /// Resolved data type
    pub data_type: DataType,
    /// Structural role
    pub field_type: FieldType,
    /// Raw samples, at most [`MAX_SAMPLES`]
    pub sample_values: Vec<Vec<u8>>,
    /// Distinct samples / total samples
    pub variance: f64,
    /// Share of samples matching the resolved type, in [0, 100]
    pub confidence: f64,
    /// All samples identical
    pub is_constant: bool,
    /// Present and non-empty in every sampled package
    pub required: bool,
    /// Runtime action
    pub action: FieldAction,
    /// Regex that extracts the value
    pub parse_pattern: Option<String>,
    /// Format used when serializing the value
    pub format_string: Option<String>,
    /// Measurement unit, when known
    pub unit: Option<String>,
    /// Padding side, when padded
    pub alignment: Option<Alignment>,
    /// Shortest raw sample
    pub min_length: usize,
    /// Longest raw sample
    pub max_length: usize,
    /// Whether the generator should export this field
    pub include_in_definition: bool,
}

impl FieldInfo {
    /// Create a parse field with no samples
    pub fn new(order: usize, name: impl Into<String>, data_type: DataType) -> Self {
        let field_type = match data_type {
            DataType::Integer => FieldType::Integer,
            DataType::Float => FieldType::Decimal,
            DataType::DateTime => FieldType::Date,
            DataType::String => FieldType::Text,
            DataType::Hex => FieldType::Hex,
            DataType::Binary => FieldType::Binary,
        };
        Self {
            order,
            name: name.into(),
            data_type,
            field_type,
            sample_values: Vec::new(),
            variance: 0.0,
            confidence: 0.0,
            is_constant: false,
            required: true,
            action: FieldAction::Parse,
            parse_pattern: None,
            format_string: None,
            unit: None,
            alignment: None,
            min_length: 0,
            max_length: 0,
            include_in_definition: true,
        }
    }

    /// Attach samples and recompute variance, constancy and lengths
    pub fn with_samples(mut self, samples: Vec<Vec<u8>>) -> Self {
        self.set_samples(samples);
        self
    }

    /// Replace samples and recompute variance, constancy and lengths
    pub fn set_samples(&mut self, mut samples: Vec<Vec<u8>>) {
        samples.truncate(MAX_SAMPLES);
        let distinct = distinct_count(&samples);
        self.variance = if samples.is_empty() {
            0.0
        } else {
            distinct as f64 / samples.len() as f64
        };
        self.is_constant = distinct == 1;
        self.min_length = samples.iter().map(Vec::len).min().unwrap_or(0);
        self.max_length = samples.iter().map(Vec::len).max().unwrap_or(0);
        self.sample_values = samples;
    }

    /// Whether this field is a start/end/position marker
    pub fn is_marker(&self) -> bool {
        self.field_type.is_marker()
    }
}

fn distinct_count(samples: &[Vec<u8>]) -> usize {
    let mut sorted: Vec<&Vec<u8>> = samples.iter().collect();
    sorted.sort();
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variance_counts_distinct_samples() {
        let field = FieldInfo::new(0, "Field1", DataType::Integer).with_samples(vec![
            b"000".to_vec(),
            b"001".to_vec(),
            b"001".to_vec(),
            b"002".to_vec(),
        ]);
        assert_eq!(field.variance, 0.75);
        assert!(!field.is_constant);
        assert_eq!(field.min_length, 3);
    }

    #[test]
    fn test_single_distinct_value_is_constant() {
        let field = FieldInfo::new(0, "Unit", DataType::String)
            .with_samples(vec![b"kg".to_vec(), b"kg".to_vec()]);
        assert!(field.is_constant);
        assert_eq!(field.variance, 0.5);
    }

    #[test]
    fn test_samples_are_capped() {
        let samples = (0..25).map(|i| i.to_string().into_bytes()).collect();
        let field = FieldInfo::new(0, "Field1", DataType::Integer).with_samples(samples);
        assert_eq!(field.sample_values.len(), MAX_SAMPLES);
    }
}
