//! Validation rules derived from exported fields and relationships

use proto_model::{
    FieldAction, FieldDefinition, FieldRelationship, FieldType, RelationshipType, RuleType,
    ValidationRule,
};

fn rule(rule_type: RuleType, field: &str, description: String) -> ValidationRule {
    ValidationRule {
        rule_type,
        field: field.to_string(),
        description,
        min: None,
        max: None,
        expression: None,
        tolerance: None,
    }
}

/// Range rules in field order, then relationship rules in relationship order
pub fn generate_rules(
    fields: &[FieldDefinition],
    relationships: &[FieldRelationship],
) -> Vec<ValidationRule> {
    let mut rules: Vec<ValidationRule> = fields.iter().filter_map(range_rule).collect();

    for relationship in relationships {
        match relationship.relationship_type {
            RelationshipType::Calculate => rules.extend(formula_rule(relationship)),
            RelationshipType::Split => rules.extend(unit_rule(relationship, fields)),
            RelationshipType::Combine => {
                if let (Some(date), Some(target)) = (
                    relationship.source_fields.first(),
                    relationship.target_field.as_deref(),
                ) {
                    rules.push(rule(
                        RuleType::Relationship,
                        date,
                        format!("date and time combine into {target}"),
                    ));
                }
            }
        }
    }

    rules
}

fn range_rule(field: &FieldDefinition) -> Option<ValidationRule> {
    if field.action != FieldAction::Parse || !field.data_type.is_numeric() {
        return None;
    }
    let values: Vec<f64> = field
        .sample_values
        .iter()
        .filter_map(|s| s.trim().parse::<f64>().ok())
        .collect();
    let min = values.iter().copied().reduce(f64::min)?;
    let max = values.iter().copied().reduce(f64::max)?;

    Some(ValidationRule {
        min: Some(min),
        max: Some(max),
        ..rule(
            RuleType::Range,
            &field.name,
            format!("{} observed between {} and {}", field.name, min, max),
        )
    })
}

fn formula_rule(relationship: &FieldRelationship) -> Option<ValidationRule> {
    let target = relationship.target_field.as_deref()?;
    let [minuend, subtrahend] = relationship.source_fields.as_slice() else {
        return None;
    };
    Some(ValidationRule {
        expression: Some(format!("{target} = {minuend} - {subtrahend}")),
        tolerance: relationship.tolerance,
        ..rule(
            RuleType::Formula,
            target,
            format!("{target} must equal {minuend} minus {subtrahend}"),
        )
    })
}

/// "unit must equal 'kg'" for the constant unit half of a split
fn unit_rule(
    relationship: &FieldRelationship,
    fields: &[FieldDefinition],
) -> Option<ValidationRule> {
    let source = relationship.source_fields.first()?;
    let unit_name = format!("{source}Unit");
    let unit = fields
        .iter()
        .find(|f| f.name == unit_name && f.field_type == FieldType::Unit && f.is_constant)?;
    let value = unit.sample_values.first()?;
    Some(rule(
        RuleType::Relationship,
        &unit.name,
        format!("unit must equal '{}'", value.trim()),
    ))
}
