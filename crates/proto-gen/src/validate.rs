//! Definition validation
//!
//! Problems are collected as messages; the definition is still returned
//! so the caller decides whether to accept it.

use std::collections::{BTreeMap, BTreeSet};

use proto_model::ProtocolDefinition;
use regex::Regex;
use serde::{Deserialize, Serialize};

const C_FAMILY_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
];

/// Identifier rules of the runtime that consumes the definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentifierPolicy {
    /// Words that may not be used as field names
    pub reserved: BTreeSet<String>,
    /// Whether reserved words only clash with identical case
    pub case_sensitive: bool,
}

impl Default for IdentifierPolicy {
    fn default() -> Self {
        Self::c_family()
    }
}

impl IdentifierPolicy {
    /// C#/Java/C-style keyword set
    pub fn c_family() -> Self {
        Self::custom(C_FAMILY_KEYWORDS.iter().copied(), true)
    }

    /// Rust keywords, including reserved ones
    pub fn rust() -> Self {
        Self::custom(RUST_KEYWORDS.iter().copied(), true)
    }

    pub fn custom<I, S>(reserved: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
            case_sensitive,
        }
    }

    /// ASCII letter or underscore, then letters, digits or underscores
    pub fn is_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        if self.case_sensitive {
            self.reserved.contains(name)
        } else {
            self.reserved.iter().any(|r| r.eq_ignore_ascii_case(name))
        }
    }
}

/// Check a definition, returning one message per problem
pub fn validate(definition: &ProtocolDefinition, policy: &IdentifierPolicy) -> Vec<String> {
    let mut errors = Vec::new();

    if definition.device_name.trim().is_empty() {
        errors.push("device name is empty".to_string());
    }
    if definition.version.trim().is_empty() {
        errors.push("version is empty".to_string());
    }
    if definition.fields.is_empty() {
        errors.push("definition has no fields".to_string());
    }

    let mut name_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for field in &definition.fields {
        if !IdentifierPolicy::is_identifier(&field.name) {
            errors.push(format!("field '{}' is not a valid identifier", field.name));
        } else if policy.is_reserved(&field.name) {
            errors.push(format!("field '{}' is a reserved word", field.name));
        }
        if !field.is_marker() {
            *name_counts.entry(field.name.as_str()).or_default() += 1;
        }
        if let Some(pattern) = field.parse_pattern.as_deref().filter(|p| !p.is_empty()) {
            if let Err(e) = Regex::new(pattern) {
                errors.push(format!("field '{}' has an invalid parse pattern: {}", field.name, e));
            }
        }
    }

    for (name, count) in name_counts {
        if count > 1 {
            errors.push(format!("duplicate field name '{name}' ({count} fields)"));
        }
    }

    let frame_patterns = [
        ("frameStart", &definition.frame_start),
        ("frameEnd", &definition.frame_end),
    ];
    for (key, pattern) in frame_patterns {
        if let Some(Err(e)) = pattern.as_deref().map(Regex::new) {
            errors.push(format!("{key} is not a valid pattern: {e}"));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use proto_model::{DataType, FieldAction, FieldDefinition, FieldType, MessageType};

    fn field(name: &str, field_type: FieldType) -> FieldDefinition {
        FieldDefinition {
            order: 0,
            name: name.to_string(),
            data_type: DataType::String,
            field_type,
            sample_values: vec!["x".to_string()],
            confidence: 100.0,
            min_length: 1,
            max_length: 1,
            is_constant: true,
            action: FieldAction::Parse,
            required: true,
            parse_pattern: Some("^(.*)$".to_string()),
            format_string: None,
            unit: None,
            alignment: None,
        }
    }

    fn definition(fields: Vec<FieldDefinition>) -> ProtocolDefinition {
        ProtocolDefinition {
            device_name: "Scale".to_string(),
            version: "1.0".to_string(),
            generated_date: None,
            encoding_name: "ASCII".to_string(),
            description: None,
            message_type: MessageType::SingleLine,
            entry_terminator: None,
            frame_start: None,
            frame_end: None,
            fields,
            relationships: Vec::new(),
            validation_rules: Vec::new(),
        }
    }

    #[test]
    fn test_valid_definition() {
        let def = definition(vec![field("Weight", FieldType::Text)]);
        assert!(validate(&def, &IdentifierPolicy::default()).is_empty());
    }

    #[test]
    fn test_missing_metadata_and_fields() {
        let mut def = definition(Vec::new());
        def.device_name = " ".to_string();
        def.version = String::new();
        let errors = validate(&def, &IdentifierPolicy::default());
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_duplicate_names_ignore_markers() {
        let def = definition(vec![
            field("Marker", FieldType::Marker),
            field("Marker", FieldType::Marker),
            field("Weight", FieldType::Text),
            field("Weight", FieldType::Decimal),
        ]);
        let errors = validate(&def, &IdentifierPolicy::default());
        assert_eq!(errors, vec!["duplicate field name 'Weight' (2 fields)"]);
    }

    #[test]
    fn test_identifiers_and_keywords() {
        let def = definition(vec![
            field("1st", FieldType::Text),
            field("class", FieldType::Text),
            field("fn", FieldType::Text),
        ]);
        assert_eq!(validate(&def, &IdentifierPolicy::c_family()).len(), 2);

        let errors = validate(&def, &IdentifierPolicy::rust());
        assert_eq!(errors.len(), 2);
        assert!(errors[1].contains("'fn'"));

        let loose = IdentifierPolicy::custom(["CLASS"], false);
        assert!(loose.is_reserved("class"));
    }

    #[test]
    fn test_invalid_pattern() {
        let mut f = field("Weight", FieldType::Text);
        f.parse_pattern = Some("^(unclosed$".to_string());
        let errors = validate(&definition(vec![f]), &IdentifierPolicy::default());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("invalid parse pattern"));
    }
}
