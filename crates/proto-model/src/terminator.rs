//! Terminator candidates and the frame/segment/field hierarchy

use crate::encoding::{code_units, EncodingKind};

/// Confidence at or above which a hierarchy level counts as confident
pub const CONFIDENT_THRESHOLD: f64 = 0.5;

/// Start-of-header control byte
pub const SOH: u8 = 0x01;
/// Start-of-text control byte
pub const STX: u8 = 0x02;
/// End-of-text control byte
pub const ETX: u8 = 0x03;
/// Record separator control byte
pub const RS: u8 = 0x1E;
/// Unit separator control byte
pub const US: u8 = 0x1F;

/// A byte sequence proposed as a structural boundary
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TerminatorCandidate {
    /// Raw terminator bytes
    pub bytes: Vec<u8>,
    /// Human-readable name (e.g. "CRLF", "','")
    pub display_name: String,
    /// Occurrence rate relative to structural units, in [0, 1]
    pub frequency: f64,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Number of non-overlapping occurrences
    pub occurrences: usize,
    /// Mean distance in bytes between consecutive occurrences
    pub mean_gap: f64,
    /// Ranking score (occurrences x length / (CV + 0.1))
    pub score: f64,
}

impl TerminatorCandidate {
    /// Create a candidate with no statistics attached
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            display_name: display_name(&bytes),
            bytes,
            frequency: 0.0,
            confidence: 0.0,
            occurrences: 0,
            mean_gap: 0.0,
            score: 0.0,
        }
    }

    /// Create a candidate with a fixed confidence (used for overrides)
    pub fn with_confidence(bytes: Vec<u8>, confidence: f64) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
            ..Self::new(bytes)
        }
    }

    /// Whether this candidate meets the confidence threshold
    pub fn is_confident(&self) -> bool {
        self.confidence >= CONFIDENT_THRESHOLD
    }

    /// Whether the first byte is a frame-start control byte (SOH/STX)
    pub fn is_start_marker(&self) -> bool {
        matches!(self.bytes.first(), Some(&SOH) | Some(&STX))
    }
}

/// The three independently detected boundary levels
///
/// Levels are conceptually nested but nothing guarantees they differ;
/// a segment equal to the frame terminator is a legal duplicate.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TerminatorHierarchy {
    /// Outermost boundary
    pub frame: Option<TerminatorCandidate>,
    /// Line or sub-unit boundary within a frame
    pub segment: Option<TerminatorCandidate>,
    /// Separator between fields within a segment
    pub field_delimiter: Option<TerminatorCandidate>,
    /// Control sequence opening each frame (SOH/STX), if any
    pub frame_start: Option<TerminatorCandidate>,
}

impl TerminatorHierarchy {
    /// Segment level if it is confident and distinct from the frame level
    pub fn distinct_segment(&self) -> Option<&TerminatorCandidate> {
        let segment = self.segment.as_ref().filter(|s| s.is_confident())?;
        match &self.frame {
            Some(frame) if frame.bytes == segment.bytes => None,
            _ => Some(segment),
        }
    }

    /// Field delimiter if it is confident
    pub fn confident_field_delimiter(&self) -> Option<&TerminatorCandidate> {
        self.field_delimiter.as_ref().filter(|f| f.is_confident())
    }

    /// Iterate over the levels that are present
    pub fn present_levels(&self) -> impl Iterator<Item = &TerminatorCandidate> {
        [&self.frame, &self.segment, &self.field_delimiter]
            .into_iter()
            .filter_map(Option::as_ref)
    }
}

fn control_name(byte: u8) -> Option<&'static str> {
    Some(match byte {
        0x00 => "NUL",
        SOH => "SOH",
        STX => "STX",
        ETX => "ETX",
        0x04 => "EOT",
        0x05 => "ENQ",
        0x06 => "ACK",
        0x09 => "TAB",
        0x0A => "LF",
        0x0D => "CR",
        0x15 => "NAK",
        0x17 => "ETB",
        0x1B => "ESC",
        RS => "RS",
        US => "US",
        _ => return None,
    })
}

/// Human-readable name for a terminator byte sequence
pub fn display_name(bytes: &[u8]) -> String {
    match bytes {
        [] => return "(none)".to_string(),
        b"\r\n" => return "CRLF".to_string(),
        b"\n\r" => return "LFCR".to_string(),
        b" " => return "SPACE".to_string(),
        _ => {}
    }

    if bytes.iter().all(|b| (0x20..=0x7E).contains(b)) {
        return format!("'{}'", String::from_utf8_lossy(bytes));
    }

    let mut parts = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"\r\n") {
            parts.push("CRLF".to_string());
            i += 2;
            continue;
        }
        let b = bytes[i];
        parts.push(match control_name(b) {
            Some(name) => name.to_string(),
            None if (0x20..=0x7E).contains(&b) => format!("'{}'", char::from(b)),
            None => format!("0x{:02X}", b),
        });
        i += 1;
    }
    parts.join("+")
}

/// Human-readable name for a terminator in a given encoding
///
/// Code units are named rather than raw bytes, so a UTF-16LE comma is
/// `','` and not `','+NUL`.
pub fn display_name_in(kind: EncodingKind, bytes: &[u8]) -> String {
    let narrowed: Vec<u8> = code_units(kind, bytes)
        .into_iter()
        .map(|u| u8::try_from(u).unwrap_or(b'?'))
        .collect();
    display_name(&narrowed)
}

/// Escape text the way it would appear in a string literal
///
/// `\r`, `\n`, `\t` and `\\` use short escapes, other characters outside
/// printable ASCII become `\uXXXX`.
pub fn escape_text(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        match c {
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
        }
    }
    out
}
