//! Byte-pattern field classification
//!
//! Samples are inspected as code units of the detected encoding and never
//! converted to text for typing decisions. Text is only decoded to build
//! literal parse patterns and to name units and labels.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use proto_model::encoding::code_units;
use proto_model::{
    decode, Alignment, DataType, EncodingKind, FieldAction, FieldInfo, FieldType,
};
use tracing::debug;

use crate::extract::PackageLayout;

/// Regex for integer fields
pub const INTEGER_PATTERN: &str = r"^(\d+)$";
/// Regex for decimal fields
pub const DECIMAL_PATTERN: &str = r"^([+-]?\d+\.?\d*)$";
/// Regex for time fields
pub const TIME_PATTERN: &str = r"^(\d{2}:\d{2}(?::\d{2})?)$";
/// Regex for hex fields
pub const HEX_PATTERN: &str = r"^([0-9A-Fa-f]+)$";
/// Regex for free text fields
pub const TEXT_PATTERN: &str = r"^(.*)$";

/// Digit/separator layouts recognised as dates: (layout, regex, format)
///
/// `D` stands for any ASCII digit; every other byte must match literally.
const DATE_LAYOUTS: [(&[u8], &str, &str); 7] = [
    (b"DDDD-DD-DD", r"^(\d{4}-\d{2}-\d{2})$", "yyyy-MM-dd"),
    (b"DDDD/DD/DD", r"^(\d{4}/\d{2}/\d{2})$", "yyyy/MM/dd"),
    (b"DD-DD-DDDD", r"^(\d{2}-\d{2}-\d{4})$", "dd-MM-yyyy"),
    (b"DD/DD/DDDD", r"^(\d{2}/\d{2}/\d{4})$", "dd/MM/yyyy"),
    (b"DD.DD.DDDD", r"^(\d{2}\.\d{2}\.\d{4})$", "dd.MM.yyyy"),
    (b"DD-DD-DD", r"^(\d{2}-\d{2}-\d{2})$", "dd-MM-yy"),
    (b"DD/DD/DD", r"^(\d{2}/\d{2}/\d{2})$", "dd/MM/yy"),
];

const TIME_LAYOUTS: [(&[u8], &str); 2] = [(b"DD:DD:DD", "HH:mm:ss"), (b"DD:DD", "HH:mm")];

/// Constant suffixes recognised as measurement units
pub const KNOWN_UNITS: [&str; 14] = [
    "kg", "KG", "g", "lb", "LB", "lbs", "oz", "t", "pcs", "PCS", "°C", "°F", "pH", "%",
];

/// Weight role named by a label token, if any
pub fn weight_role(label: &str) -> Option<&'static str> {
    match label.trim().to_ascii_uppercase().as_str() {
        "G" | "GS" | "GW" | "GROSS" | "BRUTTO" => Some("Gross"),
        "N" | "NT" | "NW" | "NET" | "NETTO" => Some("Net"),
        "T" | "TR" | "TW" | "TARE" | "PT" => Some("Tare"),
        _ => None,
    }
}

/// Shape of a single sample after trimming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    Empty,
    Integer,
    Decimal,
    /// Index into the date layout table
    Date(usize),
    /// Index into the time layout table
    Time(usize),
    Hex,
    Binary,
    Text,
}

/// Majority bucket; layouts of the same kind vote together
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Kind {
    Integer,
    Decimal,
    Date,
    Time,
    Hex,
    Binary,
    Text,
}

impl ByteClass {
    fn kind(self) -> Kind {
        match self {
            ByteClass::Integer => Kind::Integer,
            ByteClass::Decimal => Kind::Decimal,
            ByteClass::Date(_) => Kind::Date,
            ByteClass::Time(_) => Kind::Time,
            ByteClass::Hex => Kind::Hex,
            ByteClass::Binary => Kind::Binary,
            ByteClass::Empty | ByteClass::Text => Kind::Text,
        }
    }
}

fn is_whitespace_unit(u: u32) -> bool {
    matches!(u, 0x20 | 0x09 | 0x0D | 0x0A)
}

fn is_padding_unit(u: u32) -> bool {
    matches!(u, 0x20 | 0x09)
}

fn is_digit(u: u32) -> bool {
    (0x30..=0x39).contains(&u)
}

fn is_hex_letter(u: u32) -> bool {
    (0x41..=0x46).contains(&u) || (0x61..=0x66).contains(&u)
}

fn is_alphanumeric(u: u32) -> bool {
    char::from_u32(u).is_some_and(|c| c.is_ascii_alphanumeric())
}

/// Range of units left after trimming whitespace
fn trim_range(units: &[u32]) -> Range<usize> {
    let start = units
        .iter()
        .position(|&u| !is_whitespace_unit(u))
        .unwrap_or(units.len());
    let end = units
        .iter()
        .rposition(|&u| !is_whitespace_unit(u))
        .map_or(start, |p| p + 1);
    start..end
}

fn matches_layout(units: &[u32], layout: &[u8]) -> bool {
    units.len() == layout.len()
        && units.iter().zip(layout).all(|(&u, &l)| match l {
            b'D' => is_digit(u),
            _ => u == u32::from(l),
        })
}

fn is_decimal(units: &[u32]) -> bool {
    let digits = match units.first() {
        Some(&u) if u == u32::from(b'+') || u == u32::from(b'-') => &units[1..],
        _ => units,
    };
    let Some(dot) = digits.iter().position(|&u| u == u32::from(b'.')) else {
        return false;
    };
    let (int, frac) = (&digits[..dot], &digits[dot + 1..]);
    !int.is_empty()
        && !frac.is_empty()
        && int.iter().all(|&u| is_digit(u))
        && frac.iter().all(|&u| is_digit(u))
}

fn is_binary_unit(u: u32, encoding: EncodingKind) -> bool {
    (u < 0x20 && u != 0x09) || u == 0x7F || (encoding == EncodingKind::Ascii && u >= 0x80)
}

/// Classify already-decoded code units
pub fn classify_units(units: &[u32], encoding: EncodingKind) -> ByteClass {
    let t = &units[trim_range(units)];
    if t.is_empty() {
        return ByteClass::Empty;
    }
    if t.iter().all(|&u| is_digit(u)) {
        return ByteClass::Integer;
    }
    if is_decimal(t) {
        return ByteClass::Decimal;
    }
    if let Some(i) = DATE_LAYOUTS.iter().position(|(l, _, _)| matches_layout(t, l)) {
        return ByteClass::Date(i);
    }
    if let Some(i) = TIME_LAYOUTS.iter().position(|(l, _)| matches_layout(t, l)) {
        return ByteClass::Time(i);
    }
    if t.iter().any(|&u| is_binary_unit(u, encoding)) {
        return ByteClass::Binary;
    }
    if t.len() % 2 == 0
        && t.iter().all(|&u| is_digit(u) || is_hex_letter(u))
        && t.iter().any(|&u| is_hex_letter(u))
        && t.iter().any(|&u| is_digit(u))
    {
        return ByteClass::Hex;
    }
    ByteClass::Text
}

/// Classify a raw sample
pub fn classify_bytes(raw: &[u8], encoding: EncodingKind) -> ByteClass {
    classify_units(&code_units(encoding, raw), encoding)
}

/// Majority vote over samples: (class, samples matching it)
///
/// Below the threshold the field falls back to text. Integer and decimal
/// samples vote together for decimal when both occur.
pub fn resolve_majority(classes: &[ByteClass], threshold: f64) -> (ByteClass, usize) {
    let total = classes.len();
    if total == 0 {
        return (ByteClass::Empty, 0);
    }

    let mut votes: BTreeMap<Kind, usize> = BTreeMap::new();
    for c in classes {
        *votes.entry(c.kind()).or_default() += 1;
    }
    let meets = |n: usize| n as f64 / total as f64 >= threshold;

    let integers = votes.get(&Kind::Integer).copied().unwrap_or(0);
    let decimals = votes.get(&Kind::Decimal).copied().unwrap_or(0);
    if integers > 0 && decimals > 0 && meets(integers + decimals) {
        return (ByteClass::Decimal, integers + decimals);
    }

    // BTreeMap iteration gives the Kind order as tie-break
    let (kind, count) = votes
        .iter()
        .fold((Kind::Text, 0), |best, (&k, &n)| if n > best.1 { (k, n) } else { best });

    if meets(count) {
        // Representative class keeps the first sample's layout
        let class = classes
            .iter()
            .copied()
            .find(|c| c.kind() == kind)
            .unwrap_or(ByteClass::Text);
        (class, count)
    } else {
        (ByteClass::Text, votes.get(&Kind::Text).copied().unwrap_or(0))
    }
}

/// Field classifier over sampled package layouts
#[derive(Debug, Clone)]
pub struct FieldClassifier {
    encoding: EncodingKind,
    majority_threshold: f64,
}

impl FieldClassifier {
    pub fn new(encoding: EncodingKind, majority_threshold: f64) -> Self {
        Self {
            encoding,
            majority_threshold,
        }
    }

    /// Classify every field position of the sampled packages
    pub fn classify(&self, layouts: &[PackageLayout<'_>]) -> Vec<FieldInfo> {
        let positions = layouts.iter().map(PackageLayout::field_count).max().unwrap_or(0);

        let mut fields: Vec<FieldInfo> = (0..positions)
            .map(|pos| {
                let samples: Vec<Vec<u8>> = layouts
                    .iter()
                    .filter_map(|l| l.fields().nth(pos))
                    .map(<[u8]>::to_vec)
                    .collect();
                let required = layouts.iter().all(|l| {
                    l.fields()
                        .nth(pos)
                        .is_some_and(|f| !self.trimmed(f).is_empty())
                });
                let mut field = self.classify_position(pos, samples);
                field.required = required;
                field
            })
            .collect();

        self.tag_units_and_labels(&mut fields);
        if let Some(first) = layouts.first() {
            self.tag_frame_markers(&mut fields, first);
        }
        make_names_unique(&mut fields);

        for f in &fields {
            debug!(
                "Field {} {}: {:?}/{:?} confidence {:.0} variance {:.2} action {:?}",
                f.order, f.name, f.data_type, f.field_type, f.confidence, f.variance, f.action
            );
        }
        fields
    }

    /// Bytes of `raw` left after trimming whitespace units
    fn trimmed<'a>(&self, raw: &'a [u8]) -> &'a [u8] {
        let size = self.encoding.code_unit_size();
        let range = trim_range(&code_units(self.encoding, raw));
        &raw[range.start * size..range.end * size]
    }

    fn trimmed_text(&self, raw: &[u8]) -> String {
        decode(self.encoding, self.trimmed(raw))
    }

    /// Classify one field position from its raw samples
    pub fn classify_position(&self, order: usize, samples: Vec<Vec<u8>>) -> FieldInfo {
        let name = format!("Field{}", order + 1);
        let classes: Vec<ByteClass> = samples
            .iter()
            .map(|s| classify_bytes(s, self.encoding))
            .collect();

        if classes.iter().all(|c| *c == ByteClass::Empty) {
            let mut field = FieldInfo::new(order, name, DataType::String).with_samples(samples);
            field.field_type = FieldType::Empty;
            field.action = FieldAction::Skip;
            field.confidence = 100.0;
            return field;
        }

        let (class, matching) = resolve_majority(&classes, self.majority_threshold);
        let data_type = match class {
            ByteClass::Integer => DataType::Integer,
            ByteClass::Decimal => DataType::Float,
            ByteClass::Date(_) | ByteClass::Time(_) => DataType::DateTime,
            ByteClass::Hex => DataType::Hex,
            ByteClass::Binary => DataType::Binary,
            ByteClass::Empty | ByteClass::Text => DataType::String,
        };

        let mut field = FieldInfo::new(order, name, data_type).with_samples(samples);
        field.confidence = matching as f64 / classes.len() as f64 * 100.0;
        field.alignment = alignment(&field.sample_values, self.encoding);

        let texts: Vec<String> = field
            .sample_values
            .iter()
            .map(|s| self.trimmed_text(s))
            .collect();

        match class {
            ByteClass::Integer => {
                field.parse_pattern = Some(INTEGER_PATTERN.to_string());
                let zero_padded = texts.iter().any(|t| t.len() > 1 && t.starts_with('0'));
                if zero_padded {
                    let width = texts.iter().map(String::len).max().unwrap_or(0);
                    field.format_string = Some(format!("D{width}"));
                }
            }
            ByteClass::Decimal => {
                field.parse_pattern = Some(DECIMAL_PATTERN.to_string());
                let decimals = texts
                    .iter()
                    .filter_map(|t| t.split_once('.').map(|(_, frac)| frac.len()))
                    .max()
                    .unwrap_or(0);
                field.format_string = Some(format!("F{decimals}"));
            }
            ByteClass::Date(i) => {
                field.field_type = FieldType::Date;
                field.parse_pattern = Some(DATE_LAYOUTS[i].1.to_string());
                field.format_string = Some(DATE_LAYOUTS[i].2.to_string());
            }
            ByteClass::Time(i) => {
                field.field_type = FieldType::Time;
                field.parse_pattern = Some(TIME_PATTERN.to_string());
                field.format_string = Some(TIME_LAYOUTS[i].1.to_string());
            }
            ByteClass::Hex => field.parse_pattern = Some(HEX_PATTERN.to_string()),
            ByteClass::Binary => {}
            ByteClass::Empty | ByteClass::Text => {
                field.parse_pattern = Some(TEXT_PATTERN.to_string());
            }
        }

        if field.is_constant {
            let trimmed = self.trimmed(&field.sample_values[0]).to_vec();
            let units = code_units(self.encoding, &trimmed);
            let literal = Some(literal_pattern(&texts[0]));

            if units.len() >= 2 && units.iter().all(|&u| u == u32::from(b'0')) {
                field.field_type = FieldType::Reserved;
                field.action = FieldAction::Skip;
                field.parse_pattern = literal;
            } else if class.kind() == Kind::Text && !units.iter().any(|&u| is_alphanumeric(u)) {
                field.field_type = FieldType::Marker;
                field.action = FieldAction::Validate;
                field.parse_pattern = literal;
            } else if class.kind() == Kind::Text {
                field.parse_pattern = literal;
            }
        }

        field
    }

    /// Tag unit suffixes and weight labels, naming their neighbours
    fn tag_units_and_labels(&self, fields: &mut [FieldInfo]) {
        let data: Vec<usize> = (0..fields.len())
            .filter(|&i| fields[i].field_type != FieldType::Empty)
            .collect();
        let is_numeric = |f: &FieldInfo| f.data_type.is_numeric() && f.action == FieldAction::Parse;

        for (pos, &i) in data.iter().enumerate() {
            if !fields[i].is_constant || fields[i].field_type != FieldType::Text {
                continue;
            }
            let text = self.trimmed_text(&fields[i].sample_values[0]);
            let prev = pos.checked_sub(1).map(|p| data[p]);
            let next = data.get(pos + 1).copied();

            let labelled = next.filter(|&n| is_numeric(&fields[n]));
            if let (Some(role), Some(n)) = (weight_role(&text), labelled) {
                fields[n].name = role.to_string();
                let label = &mut fields[i];
                label.field_type = FieldType::Label;
                label.action = FieldAction::Validate;
                label.name = format!("{role}Label");
            } else if KNOWN_UNITS.contains(&text.as_str()) {
                if let Some(p) = prev.filter(|&p| is_numeric(&fields[p])) {
                    fields[p].unit = Some(text.clone());
                    let unit_name = format!("{}Unit", fields[p].name);
                    let unit = &mut fields[i];
                    unit.field_type = FieldType::Unit;
                    unit.action = FieldAction::Validate;
                    unit.unit = Some(text);
                    unit.name = unit_name;
                }
            }
        }
    }

    /// Tag single-field first/last segments of multi-segment packages
    fn tag_frame_markers(&self, fields: &mut [FieldInfo], layout: &PackageLayout<'_>) {
        if layout.segments.len() < 2 {
            return;
        }
        let last_index = layout.field_count().saturating_sub(1);
        let candidates = [
            (layout.segments.first(), 0, FieldType::StartMarker, "StartMarker"),
            (layout.segments.last(), last_index, FieldType::EndMarker, "EndMarker"),
        ];

        for (segment, index, tag, name) in candidates {
            if segment.map(Vec::len) != Some(1) {
                continue;
            }
            let Some(field) = fields.get_mut(index) else {
                continue;
            };
            let plain_text = field.data_type == DataType::String
                && matches!(field.field_type, FieldType::Text | FieldType::Marker);
            if plain_text {
                field.field_type = tag;
                field.action = FieldAction::Validate;
                field.name = name.to_string();
            }
        }
    }
}

/// `^(<escaped literal>)$`
pub fn literal_pattern(text: &str) -> String {
    format!("^({})$", regex::escape(text))
}

/// Padding side observed across raw samples
fn alignment(samples: &[Vec<u8>], encoding: EncodingKind) -> Option<Alignment> {
    let mut leading = false;
    let mut trailing = false;
    for s in samples {
        let units = code_units(encoding, s);
        leading |= units.first().is_some_and(|&u| is_padding_unit(u));
        trailing |= units.last().is_some_and(|&u| is_padding_unit(u));
    }
    match (leading, trailing) {
        (true, _) => Some(Alignment::Right),
        (false, true) => Some(Alignment::Left),
        (false, false) => None,
    }
}

/// Suffix clashing non-marker names with 2, 3, ...
fn make_names_unique(fields: &mut [FieldInfo]) {
    let original: BTreeSet<String> = fields
        .iter()
        .filter(|f| !f.is_marker())
        .map(|f| f.name.clone())
        .collect();
    let mut used = BTreeSet::new();
    for f in fields.iter_mut().filter(|f| !f.is_marker()) {
        if used.contains(&f.name) {
            let base = f.name.clone();
            let mut n = 2;
            let mut candidate = format!("{base}{n}");
            while used.contains(&candidate) || original.contains(&candidate) {
                n += 1;
                candidate = format!("{base}{n}");
            }
            f.name = candidate;
        }
        used.insert(f.name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classifier() -> FieldClassifier {
        FieldClassifier::new(EncodingKind::Ascii, 0.8)
    }

    fn samples(values: &[&str]) -> Vec<Vec<u8>> {
        values.iter().map(|v| v.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_byte_classes() {
        let c = |s: &str| classify_bytes(s.as_bytes(), EncodingKind::Ascii);
        assert_eq!(c("  \r\n"), ByteClass::Empty);
        assert_eq!(c(" 0042 "), ByteClass::Integer);
        assert_eq!(c("-12.50"), ByteClass::Decimal);
        assert_eq!(c("12."), ByteClass::Text);
        assert_eq!(c("2024-03-01"), ByteClass::Date(0));
        assert_eq!(c("01/03/2024"), ByteClass::Date(3));
        assert_eq!(c("12:30:05"), ByteClass::Time(0));
        assert_eq!(c("12:30"), ByteClass::Time(1));
        assert_eq!(c("1A2B"), ByteClass::Hex);
        assert_eq!(c("ABCD"), ByteClass::Text);
        assert_eq!(c("A\x01B"), ByteClass::Binary);
        assert_eq!(c("kg"), ByteClass::Text);
    }

    #[test]
    fn test_hex_needs_a_digit() {
        let c = |s: &str| classify_bytes(s.as_bytes(), EncodingKind::Ascii);
        assert_eq!(c("BEEF"), ByteClass::Text);
        assert_eq!(c("AD"), ByteClass::Text);
        assert_eq!(c("cafe"), ByteClass::Text);
        assert_eq!(c("0D0A"), ByteClass::Hex);
        assert_eq!(c("ff00"), ByteClass::Hex);
    }

    #[test]
    fn test_utf16_samples_classify_by_code_unit() {
        let raw = proto_model::encode(EncodingKind::Utf16Le, " 12.5");
        assert_eq!(classify_bytes(&raw, EncodingKind::Utf16Le), ByteClass::Decimal);
    }

    #[test]
    fn test_zero_padded_integers() {
        let f = classifier().classify_position(0, samples(&["000", "001", "002"]));
        assert_eq!(f.data_type, DataType::Integer);
        assert_eq!(f.confidence, 100.0);
        assert_eq!(f.variance, 1.0);
        assert_eq!(f.format_string.as_deref(), Some("D3"));
        assert_eq!(f.parse_pattern.as_deref(), Some(INTEGER_PATTERN));
    }

    #[test]
    fn test_majority_below_threshold_is_string() {
        let f = classifier().classify_position(0, samples(&["1", "2", "3", "x", "y"]));
        assert_eq!(f.data_type, DataType::String);
        assert_eq!(f.confidence, 40.0);
    }

    #[test]
    fn test_integers_and_decimals_widen() {
        let f = classifier().classify_position(0, samples(&["12", "12.5", "13.25", "14", "15"]));
        assert_eq!(f.data_type, DataType::Float);
        assert_eq!(f.confidence, 100.0);
        assert_eq!(f.format_string.as_deref(), Some("F2"));
    }

    #[test]
    fn test_all_empty_field() {
        let f = classifier().classify_position(2, samples(&["", " ", ""]));
        assert_eq!(f.field_type, FieldType::Empty);
        assert_eq!(f.action, FieldAction::Skip);
        assert_eq!(f.name, "Field3");
    }

    #[test]
    fn test_reserved_and_marker() {
        let f = classifier().classify_position(0, samples(&["00", "00"]));
        assert_eq!(f.field_type, FieldType::Reserved);
        assert_eq!(f.action, FieldAction::Skip);

        let f = classifier().classify_position(0, samples(&["*", "*"]));
        assert_eq!(f.field_type, FieldType::Marker);
        assert_eq!(f.parse_pattern.as_deref(), Some(r"^(\*)$"));
    }

    #[test]
    fn test_alignment_from_padding() {
        let f = classifier().classify_position(0, samples(&["  1.5", " 12.5"]));
        assert_eq!(f.alignment, Some(Alignment::Right));
        let f = classifier().classify_position(0, samples(&["ab  ", "cd"]));
        assert_eq!(f.alignment, Some(Alignment::Left));
    }

    #[test]
    fn test_unit_and_label_tagging() {
        let layouts = [
            PackageLayout {
                segments: vec![vec![b"GS", b"1.94", b"kg"]],
            },
            PackageLayout {
                segments: vec![vec![b"GS", b"2.10", b"kg"]],
            },
        ];
        let fields = classifier().classify(&layouts);

        assert_eq!(fields[0].field_type, FieldType::Label);
        assert_eq!(fields[0].name, "GrossLabel");
        assert_eq!(fields[1].name, "Gross");
        assert_eq!(fields[1].unit.as_deref(), Some("kg"));
        assert_eq!(fields[2].field_type, FieldType::Unit);
        assert_eq!(fields[2].name, "GrossUnit");
        assert_eq!(fields[2].action, FieldAction::Validate);
    }

    #[test]
    fn test_start_and_end_marker_segments() {
        let layouts = [
            PackageLayout {
                segments: vec![vec![b"BEGIN"], vec![b"W", b"1.5"], vec![b"END"]],
            },
            PackageLayout {
                segments: vec![vec![b"BEGIN"], vec![b"W", b"2.5"], vec![b"END"]],
            },
        ];
        let fields = classifier().classify(&layouts);
        assert_eq!(fields[0].field_type, FieldType::StartMarker);
        assert_eq!(fields[0].name, "StartMarker");
        assert_eq!(fields[3].field_type, FieldType::EndMarker);
        assert_eq!(fields[3].parse_pattern.as_deref(), Some("^(END)$"));
    }

    #[test]
    fn test_repeated_labels_get_unique_names() {
        let layouts = [
            PackageLayout {
                segments: vec![vec![b"T", b"1", b"T", b"2"]],
            },
            PackageLayout {
                segments: vec![vec![b"T", b"3", b"T", b"4"]],
            },
        ];
        let fields = classifier().classify(&layouts);
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["TareLabel", "Tare", "TareLabel2", "Tare2"]);
    }

    #[test]
    fn test_required_means_non_empty_everywhere() {
        let layouts = [
            PackageLayout {
                segments: vec![vec![b"a", b"1"]],
            },
            PackageLayout {
                segments: vec![vec![b"b", b" "]],
            },
            PackageLayout {
                segments: vec![vec![b"c"]],
            },
        ];
        let fields = classifier().classify(&layouts);
        assert!(fields[0].required);
        assert!(!fields[1].required);
    }

    proptest! {
        #[test]
        fn test_confidence_and_variance_bounds(
            values in prop::collection::vec("[0-9a-z .]{0,6}", 1..10)
        ) {
            let raw: Vec<Vec<u8>> = values.iter().map(|v| v.as_bytes().to_vec()).collect();
            let f = classifier().classify_position(0, raw);
            prop_assert!((0.0..=100.0).contains(&f.confidence));
            prop_assert!((0.0..=1.0).contains(&f.variance));
            prop_assert!(f.min_length <= f.max_length);
        }

        #[test]
        fn test_digit_strings_are_integers(value in "[0-9]{1,12}") {
            prop_assert_eq!(
                classify_bytes(value.as_bytes(), EncodingKind::Ascii),
                ByteClass::Integer
            );
        }
    }
}
