//! Text encodings recognised by the detector
//!
//! Encodings are a closed set. Decoding and encoding are free functions
//! over [`EncodingKind`] so callers never need a trait object.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Replacement used when a byte sequence cannot be decoded
const REPLACEMENT: char = '\u{FFFD}';

/// Supported text encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncodingKind {
    /// 7-bit ASCII
    Ascii,
    /// UTF-8
    Utf8,
    /// UTF-16 little-endian
    Utf16Le,
    /// UTF-16 big-endian
    Utf16Be,
    /// UTF-32 little-endian
    Utf32Le,
    /// UTF-32 big-endian
    Utf32Be,
    /// ISO-8859-1
    Latin1,
}

impl EncodingKind {
    /// All encodings, in detection priority order
    pub const ALL: [EncodingKind; 7] = [
        EncodingKind::Ascii,
        EncodingKind::Utf8,
        EncodingKind::Utf16Le,
        EncodingKind::Utf16Be,
        EncodingKind::Utf32Le,
        EncodingKind::Utf32Be,
        EncodingKind::Latin1,
    ];

    /// Name written into exported definitions
    pub fn name(&self) -> &'static str {
        match self {
            EncodingKind::Ascii => "ASCII",
            EncodingKind::Utf8 => "UTF-8",
            EncodingKind::Utf16Le => "UTF-16LE",
            EncodingKind::Utf16Be => "UTF-16BE",
            EncodingKind::Utf32Le => "UTF-32LE",
            EncodingKind::Utf32Be => "UTF-32BE",
            EncodingKind::Latin1 => "ISO-8859-1",
        }
    }

    /// Size in bytes of one code unit
    pub fn code_unit_size(&self) -> usize {
        match self {
            EncodingKind::Ascii | EncodingKind::Utf8 | EncodingKind::Latin1 => 1,
            EncodingKind::Utf16Le | EncodingKind::Utf16Be => 2,
            EncodingKind::Utf32Le | EncodingKind::Utf32Be => 4,
        }
    }

    /// Byte-order mark for this encoding, if it has one
    pub fn bom(&self) -> Option<&'static [u8]> {
        match self {
            EncodingKind::Utf8 => Some(&[0xEF, 0xBB, 0xBF]),
            EncodingKind::Utf16Le => Some(&[0xFF, 0xFE]),
            EncodingKind::Utf16Be => Some(&[0xFE, 0xFF]),
            EncodingKind::Utf32Le => Some(&[0xFF, 0xFE, 0x00, 0x00]),
            EncodingKind::Utf32Be => Some(&[0x00, 0x00, 0xFE, 0xFF]),
            EncodingKind::Ascii | EncodingKind::Latin1 => None,
        }
    }
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncodingKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "ASCII" | "USASCII" => Ok(EncodingKind::Ascii),
            "UTF8" => Ok(EncodingKind::Utf8),
            "UTF16LE" | "UTF16" => Ok(EncodingKind::Utf16Le),
            "UTF16BE" => Ok(EncodingKind::Utf16Be),
            "UTF32LE" | "UTF32" => Ok(EncodingKind::Utf32Le),
            "UTF32BE" => Ok(EncodingKind::Utf32Be),
            "ISO88591" | "LATIN1" => Ok(EncodingKind::Latin1),
            _ => Err(ModelError::UnknownEncoding(s.to_string())),
        }
    }
}

/// Result of encoding detection
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodingProfile {
    /// Detected encoding
    pub kind: EncodingKind,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Human-readable explanation of the decision
    pub rationale: String,
    /// Length of the byte-order mark at the start of the buffer (0 if none)
    pub bom_length: usize,
}

impl EncodingProfile {
    /// Create a profile for a buffer without a byte-order mark
    pub fn new(kind: EncodingKind, confidence: f64, rationale: impl Into<String>) -> Self {
        Self {
            kind,
            confidence: confidence.clamp(0.0, 1.0),
            rationale: rationale.into(),
            bom_length: 0,
        }
    }

    /// Create a profile decided by a byte-order mark
    pub fn from_bom(kind: EncodingKind) -> Self {
        let bom_length = kind.bom().map(<[u8]>::len).unwrap_or(0);
        Self {
            kind,
            confidence: 1.0,
            rationale: format!("{} byte-order mark", kind.name()),
            bom_length,
        }
    }
}

/// Split a byte slice into code units of the given encoding
///
/// Trailing bytes that do not fill a whole unit are ignored.
pub fn code_units(kind: EncodingKind, bytes: &[u8]) -> Vec<u32> {
    match kind {
        EncodingKind::Ascii | EncodingKind::Utf8 | EncodingKind::Latin1 => {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
        EncodingKind::Utf16Le => bytes
            .chunks_exact(2)
            .map(|c| u32::from(u16::from_le_bytes([c[0], c[1]])))
            .collect(),
        EncodingKind::Utf16Be => bytes
            .chunks_exact(2)
            .map(|c| u32::from(u16::from_be_bytes([c[0], c[1]])))
            .collect(),
        EncodingKind::Utf32Le => bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        EncodingKind::Utf32Be => bytes
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    }
}

/// Decode bytes to text, replacing undecodable input with U+FFFD
pub fn decode(kind: EncodingKind, bytes: &[u8]) -> String {
    match kind {
        EncodingKind::Ascii => bytes
            .iter()
            .map(|&b| if b.is_ascii() { char::from(b) } else { REPLACEMENT })
            .collect(),
        EncodingKind::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        EncodingKind::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        EncodingKind::Utf16Le | EncodingKind::Utf16Be => {
            let units = code_units(kind, bytes)
                .into_iter()
                .map(|u| u as u16)
                .collect::<Vec<_>>();
            char::decode_utf16(units)
                .map(|r| r.unwrap_or(REPLACEMENT))
                .collect()
        }
        EncodingKind::Utf32Le | EncodingKind::Utf32Be => code_units(kind, bytes)
            .into_iter()
            .map(|u| char::from_u32(u).unwrap_or(REPLACEMENT))
            .collect(),
    }
}

/// Encode text, substituting `?` for characters the encoding cannot represent
pub fn encode(kind: EncodingKind, text: &str) -> Vec<u8> {
    match kind {
        EncodingKind::Ascii => text
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .collect(),
        EncodingKind::Utf8 => text.as_bytes().to_vec(),
        EncodingKind::Latin1 => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect(),
        EncodingKind::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        EncodingKind::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        EncodingKind::Utf32Le => text
            .chars()
            .flat_map(|c| u32::from(c).to_le_bytes())
            .collect(),
        EncodingKind::Utf32Be => text
            .chars()
            .flat_map(|c| u32::from(c).to_be_bytes())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trips_through_from_str() {
        for kind in EncodingKind::ALL {
            assert_eq!(kind.name().parse::<EncodingKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_from_str_is_lenient() {
        assert_eq!("utf8".parse::<EncodingKind>().unwrap(), EncodingKind::Utf8);
        assert_eq!(
            "latin-1".parse::<EncodingKind>().unwrap(),
            EncodingKind::Latin1
        );
        assert!(matches!(
            "ebcdic".parse::<EncodingKind>(),
            Err(ModelError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_decode_utf16le() {
        let bytes = encode(EncodingKind::Utf16Le, "1.94 kg\r\n");
        assert_eq!(bytes[..4], [b'1', 0x00, b'.', 0x00]);
        assert_eq!(decode(EncodingKind::Utf16Le, &bytes), "1.94 kg\r\n");
    }

    #[test]
    fn test_decode_ascii_replaces_high_bytes() {
        assert_eq!(decode(EncodingKind::Ascii, &[b'A', 0xB0, b'C']), "A\u{FFFD}C");
        assert_eq!(decode(EncodingKind::Latin1, &[b'2', b'5', 0xB0, b'C']), "25°C");
    }

    #[test]
    fn test_encode_latin1_substitutes_unrepresentable() {
        assert_eq!(encode(EncodingKind::Latin1, "°C€"), vec![0xB0, b'C', b'?']);
    }

    #[test]
    fn test_code_units_utf32be() {
        let bytes = encode(EncodingKind::Utf32Be, "\r\n");
        assert_eq!(code_units(EncodingKind::Utf32Be, &bytes), vec![0x0D, 0x0A]);
    }

    #[test]
    fn test_profile_from_bom() {
        let profile = EncodingProfile::from_bom(EncodingKind::Utf32Le);
        assert_eq!(profile.bom_length, 4);
        assert_eq!(profile.confidence, 1.0);
    }
}
