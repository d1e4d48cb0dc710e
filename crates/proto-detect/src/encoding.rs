//! Text encoding detection
//!
//! A byte-order mark is decisive. Without one, independent heuristics
//! score the buffer as ASCII, UTF-8, UTF-16LE, UTF-16BE and Latin-1 and
//! the most confident guess wins.

use proto_model::{EncodingKind, EncodingProfile};
use tracing::{debug, trace};

/// Confidence below which the best heuristic is not trusted
const MIN_HEURISTIC_CONFIDENCE: f64 = 0.5;
/// Confidence reported when falling back to ASCII
const FALLBACK_CONFIDENCE: f64 = 0.7;
/// Confidence of the Latin-1 heuristic
const LATIN1_CONFIDENCE: f64 = 0.85;

/// BOMs in match order (UTF-32LE must be tested before UTF-16LE)
const BOM_ORDER: [EncodingKind; 5] = [
    EncodingKind::Utf32Le,
    EncodingKind::Utf32Be,
    EncodingKind::Utf8,
    EncodingKind::Utf16Le,
    EncodingKind::Utf16Be,
];

/// Whether a byte is printable ASCII or a control character common in device logs
pub(crate) fn is_ascii_text_byte(b: u8) -> bool {
    matches!(b, 0x20..=0x7E | b'\t' | b'\n' | b'\r' | 0x02 | 0x03)
}

/// Outcome of walking a buffer as UTF-8
#[derive(Debug, Clone, Copy, Default)]
struct Utf8Walk {
    attempted: usize,
    valid: usize,
    invalid: usize,
    multibyte: usize,
}

impl Utf8Walk {
    fn run(data: &[u8]) -> Self {
        let mut walk = Self::default();
        let mut i = 0;
        while i < data.len() {
            walk.attempted += 1;
            // NUL never occurs in text logs; it is the signature of wider encodings
            let continuation = match data[i] {
                0x01..=0x7F => Some(0),
                0xC2..=0xDF => Some(1),
                0xE0..=0xEF => Some(2),
                0xF0..=0xF4 => Some(3),
                _ => None,
            };

            let Some(needed) = continuation else {
                walk.invalid += 1;
                i += 1;
                continue;
            };

            let tail = data.get(i + 1..i + 1 + needed);
            match tail {
                Some(tail) if tail.iter().all(|b| (0x80..=0xBF).contains(b)) => {
                    walk.valid += 1;
                    if needed > 0 {
                        walk.multibyte += 1;
                    }
                    i += needed + 1;
                }
                _ => {
                    walk.invalid += 1;
                    i += 1;
                }
            }
        }
        walk
    }

    fn ratio(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.valid as f64 / self.attempted as f64
        }
    }
}

/// Stateless encoding detector
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingDetector;

impl EncodingDetector {
    /// Create a new detector
    pub fn new() -> Self {
        Self
    }

    /// Detect the encoding of a raw buffer
    ///
    /// Never fails: empty input yields ASCII with zero confidence.
    pub fn detect(&self, data: &[u8]) -> EncodingProfile {
        if data.is_empty() {
            return EncodingProfile::new(EncodingKind::Ascii, 0.0, "empty input, assuming ASCII");
        }

        if let Some(kind) = detect_bom(data) {
            debug!("Byte-order mark identifies {}", kind);
            return EncodingProfile::from_bom(kind);
        }

        let utf8 = Utf8Walk::run(data);
        let high_bytes = data.iter().any(|&b| b >= 0x80);

        let mut proposals = vec![
            ascii_heuristic(data),
            utf8_heuristic(&utf8),
            utf16_heuristic(data, EncodingKind::Utf16Le),
            utf16_heuristic(data, EncodingKind::Utf16Be),
        ];
        if let Some(latin1) = latin1_heuristic(data, &utf8, high_bytes) {
            proposals.push(latin1);
        }

        for p in &proposals {
            trace!("{} heuristic: {:.2} ({})", p.kind, p.confidence, p.rationale);
        }

        let mut best = proposals[0].clone();
        for p in &proposals[1..] {
            if p.confidence > best.confidence {
                best = p.clone();
            }
        }

        // Equal scores: real multi-byte sequences mean the text is not pure ASCII
        if best.kind != EncodingKind::Utf8 && utf8.multibyte > 0 {
            if let Some(p) = proposals
                .iter()
                .find(|p| p.kind == EncodingKind::Utf8 && p.confidence >= best.confidence)
            {
                best = p.clone();
            }
        }

        // ASCII cannot represent high bytes that are not valid UTF-8
        if best.kind == EncodingKind::Ascii && high_bytes && utf8.invalid > 0 {
            if let Some(p) = proposals.iter().find(|p| p.kind == EncodingKind::Latin1) {
                best = EncodingProfile::new(
                    EncodingKind::Latin1,
                    best.confidence,
                    p.rationale.clone(),
                );
            }
        }

        if best.confidence < MIN_HEURISTIC_CONFIDENCE {
            debug!(
                "Best heuristic {} only {:.2}, falling back to ASCII",
                best.kind, best.confidence
            );
            return EncodingProfile::new(
                EncodingKind::Ascii,
                FALLBACK_CONFIDENCE,
                format!(
                    "no heuristic reached {:.2} (best was {} at {:.2}), assuming ASCII",
                    MIN_HEURISTIC_CONFIDENCE, best.kind, best.confidence
                ),
            );
        }

        debug!("Detected {} at {:.2}", best.kind, best.confidence);
        best
    }
}

fn detect_bom(data: &[u8]) -> Option<EncodingKind> {
    BOM_ORDER
        .into_iter()
        .find(|kind| kind.bom().is_some_and(|bom| data.starts_with(bom)))
}

fn ascii_heuristic(data: &[u8]) -> EncodingProfile {
    let valid = data.iter().filter(|&&b| is_ascii_text_byte(b)).count();
    let ratio = valid as f64 / data.len() as f64;
    let confidence = if ratio >= 0.98 {
        0.95
    } else if ratio >= 0.80 {
        0.70
    } else {
        0.30
    };
    EncodingProfile::new(
        EncodingKind::Ascii,
        confidence,
        format!(
            "{:.1}% of bytes are printable ASCII or common control characters",
            ratio * 100.0
        ),
    )
}

fn utf8_heuristic(walk: &Utf8Walk) -> EncodingProfile {
    let ratio = walk.ratio();
    let confidence = if ratio >= 0.98 && walk.invalid == 0 {
        0.95
    } else if ratio >= 0.90 {
        0.80
    } else {
        0.20
    };
    EncodingProfile::new(
        EncodingKind::Utf8,
        confidence,
        format!(
            "{} of {} UTF-8 sequences valid ({} multi-byte, {} invalid)",
            walk.valid, walk.attempted, walk.multibyte, walk.invalid
        ),
    )
}

fn utf16_heuristic(data: &[u8], kind: EncodingKind) -> EncodingProfile {
    // Index of the byte that is zero for ASCII-range code units
    let high_index = match kind {
        EncodingKind::Utf16Be => 0,
        _ => 1,
    };

    let units = data.len() / 2;
    let zero_high = data
        .chunks_exact(2)
        .filter(|unit| unit[high_index] == 0)
        .count();
    let ratio = if units == 0 {
        0.0
    } else {
        zero_high as f64 / units as f64
    };
    let confidence = if ratio >= 0.80 { 0.85 } else { 0.20 };
    EncodingProfile::new(
        kind,
        confidence,
        format!(
            "{:.1}% of 16-bit units have a zero high byte",
            ratio * 100.0
        ),
    )
}

fn latin1_heuristic(data: &[u8], utf8: &Utf8Walk, high_bytes: bool) -> Option<EncodingProfile> {
    if !high_bytes || utf8.invalid == 0 {
        return None;
    }
    let printable = data
        .iter()
        .filter(|&&b| is_ascii_text_byte(b) || b >= 0xA0)
        .count();
    let ratio = printable as f64 / data.len() as f64;
    (ratio >= 0.95).then(|| {
        EncodingProfile::new(
            EncodingKind::Latin1,
            LATIN1_CONFIDENCE,
            format!(
                "{:.1}% of bytes are printable Latin-1 and high bytes are not valid UTF-8",
                ratio * 100.0
            ),
        )
    })
}
