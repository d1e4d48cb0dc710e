//! Relationship detection (Pass 3b)
//!
//! Runs after classification as an explicit two-phase transformation:
//! [`RelationshipDetector::detect`] reads the classified fields and returns
//! a [`Derivation`]; the caller applies it to obtain the final field list.

use once_cell::sync::Lazy;
use proto_model::{
    decode, encode, DataType, EncodingKind, FieldAction, FieldInfo, FieldRelationship, FieldType,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{literal_pattern, DECIMAL_PATTERN};

/// Units recognised in compound `value unit` fields, in match order
pub const COMPOUND_UNITS: [&str; 6] = ["kg", "g", "pcs", "°C", "°F", "pH"];

static COMPOUND_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    COMPOUND_UNITS
        .iter()
        .map(|&unit| {
            let pattern = format!(r"^\s*([+-]?\d+(?:\.\d+)?)\s*{}\s*$", regex::escape(unit));
            (unit, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Relationship detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Share of samples that must match a compound pattern or a formula
    pub match_threshold: f64,
    /// Absolute tolerance of the Gross - Tare = Net identity
    pub formula_tolerance: f64,
    /// Aligned samples needed before a formula is tested
    pub min_aligned_samples: usize,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.8,
            formula_tolerance: 0.01,
            min_aligned_samples: 3,
        }
    }
}

/// Fields and relationships derived from a classified field list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derivation {
    /// Fields created by splitting compound fields
    pub new_fields: Vec<FieldInfo>,
    /// Indices (into the input list) of fields replaced by a split
    pub retired: Vec<usize>,
    pub relationships: Vec<FieldRelationship>,
}

impl Derivation {
    /// Retire split originals and append the derived fields
    ///
    /// The result is not reordered; derived fields share their original's
    /// `order`, so a stable sort by order groups them.
    pub fn apply(&self, mut fields: Vec<FieldInfo>) -> Vec<FieldInfo> {
        for &i in &self.retired {
            if let Some(f) = fields.get_mut(i) {
                f.action = FieldAction::Skip;
                f.include_in_definition = false;
            }
        }
        fields.extend(self.new_fields.iter().cloned());
        fields
    }
}

/// Stateless relationship detector
#[derive(Debug, Clone, Default)]
pub struct RelationshipDetector {
    config: RelationshipConfig,
}

impl RelationshipDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RelationshipConfig) -> Self {
        Self { config }
    }

    /// Detect split, combine and calculate relationships
    pub fn detect(&self, fields: &[FieldInfo], encoding: EncodingKind) -> Derivation {
        let mut derivation = Derivation::default();

        for (i, field) in fields.iter().enumerate() {
            if let Some((value, unit, rate)) = self.split_compound(field, encoding) {
                debug!(
                    "Split {} into {} and {} ({} {:.0}%)",
                    field.name,
                    value.name,
                    unit.name,
                    value.unit.as_deref().unwrap_or("?"),
                    rate * 100.0
                );
                derivation
                    .relationships
                    .push(FieldRelationship::split(&field.name, rate));
                derivation.new_fields.push(value);
                derivation.new_fields.push(unit);
                derivation.retired.push(i);
            }
        }

        let mut working = derivation.apply(fields.to_vec());
        working.sort_by_key(|f| f.order);

        let combines = combine_date_time(&working);
        derivation.relationships.extend(combines);

        if let Some(calculate) = self.verify_net_weight(&working, encoding) {
            derivation.relationships.push(calculate);
        }

        derivation
    }

    /// `(<Name>Value, <Name>Unit, match rate)` for a compound field
    fn split_compound(
        &self,
        field: &FieldInfo,
        encoding: EncodingKind,
    ) -> Option<(FieldInfo, FieldInfo, f64)> {
        let candidate = field.data_type == DataType::String
            && field.action == FieldAction::Parse
            && field.field_type == FieldType::Text;
        if !candidate || field.sample_values.is_empty() {
            return None;
        }

        let texts: Vec<String> = field
            .sample_values
            .iter()
            .map(|s| decode(encoding, s))
            .collect();

        COMPOUND_PATTERNS.iter().find_map(|(unit, re)| {
            let values: Vec<String> = texts
                .iter()
                .filter_map(|t| re.captures(t).map(|c| c[1].to_string()))
                .collect();
            let rate = values.len() as f64 / texts.len() as f64;
            if rate < self.config.match_threshold {
                return None;
            }

            let decimals = values
                .iter()
                .filter_map(|v| v.split_once('.').map(|(_, frac)| frac.len()))
                .max()
                .unwrap_or(0);

            let value_name = format!("{}Value", field.name);
            let mut value = FieldInfo::new(field.order, value_name, DataType::Float)
                .with_samples(values.iter().map(|v| encode(encoding, v)).collect());
            value.parse_pattern = Some(DECIMAL_PATTERN.to_string());
            value.format_string = Some(format!("F{decimals}"));
            value.unit = Some(unit.to_string());
            value.confidence = rate * 100.0;
            value.required = field.required;

            let mut unit_field =
                FieldInfo::new(field.order, format!("{}Unit", field.name), DataType::String)
                    .with_samples(vec![encode(encoding, unit); values.len()]);
            unit_field.field_type = FieldType::Unit;
            unit_field.action = FieldAction::Validate;
            unit_field.unit = Some(unit.to_string());
            unit_field.parse_pattern = Some(literal_pattern(unit));
            unit_field.confidence = rate * 100.0;
            unit_field.required = field.required;

            Some((value, unit_field, rate))
        })
    }

    /// Test `Gross - Tare = Net` against aligned samples
    fn verify_net_weight(
        &self,
        fields: &[FieldInfo],
        encoding: EncodingKind,
    ) -> Option<FieldRelationship> {
        let gross = find_role(fields, "gross")?;
        let tare = find_role(fields, "tare")?;
        let net = find_role(fields, "net")?;

        let parse = |f: &FieldInfo| -> Vec<Option<f64>> {
            f.sample_values
                .iter()
                .map(|s| decode(encoding, s).trim().parse::<f64>().ok())
                .collect()
        };
        let (g, t, n) = (parse(gross), parse(tare), parse(net));

        let aligned: Vec<(f64, f64, f64)> = g
            .iter()
            .zip(&t)
            .zip(&n)
            .filter_map(|((g, t), n)| Some(((*g)?, (*t)?, (*n)?)))
            .collect();
        if aligned.len() < self.config.min_aligned_samples {
            debug!(
                "Net weight check skipped: {} aligned samples",
                aligned.len()
            );
            return None;
        }

        let matching = aligned
            .iter()
            .filter(|(g, t, n)| (g - t - n).abs() <= self.config.formula_tolerance + f64::EPSILON)
            .count();
        let rate = matching as f64 / aligned.len() as f64;
        debug!(
            "{} - {} = {} holds for {}/{} samples",
            gross.name,
            tare.name,
            net.name,
            matching,
            aligned.len()
        );

        (rate >= self.config.match_threshold).then(|| {
            FieldRelationship::calculate(
                vec![gross.name.clone(), tare.name.clone()],
                &net.name,
                "Gross − Tare",
                rate,
                self.config.formula_tolerance,
            )
        })
    }
}

/// First parse field whose name contains `role`, case-insensitively
fn find_role<'a>(fields: &'a [FieldInfo], role: &str) -> Option<&'a FieldInfo> {
    fields
        .iter()
        .find(|f| f.action == FieldAction::Parse && f.name.to_ascii_lowercase().contains(role))
}

fn is_date_like(f: &FieldInfo) -> bool {
    f.field_type == FieldType::Date || f.name.to_ascii_lowercase().contains("date")
}

fn is_time_like(f: &FieldInfo) -> bool {
    f.field_type == FieldType::Time || f.name.to_ascii_lowercase().contains("time")
}

/// Adjacent date/time pairs among active fields
fn combine_date_time(fields: &[FieldInfo]) -> Vec<FieldRelationship> {
    let active: Vec<&FieldInfo> = fields
        .iter()
        .filter(|f| f.action != FieldAction::Skip)
        .collect();

    let mut relationships = Vec::new();
    for pair in active.windows(2) {
        let (date, time) = (pair[0], pair[1]);
        if is_date_like(date) && is_time_like(time) && !is_time_like(date) {
            let target = match relationships.len() {
                0 => "DateTime".to_string(),
                n => format!("DateTime{}", n + 1),
            };
            relationships.push(FieldRelationship::combine(&date.name, &time.name, &target));
        }
    }
    relationships
}
