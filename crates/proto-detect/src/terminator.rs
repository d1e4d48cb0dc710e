//! Terminator hierarchy detection
//!
//! Structural terminators recur at regular intervals; payload tokens recur
//! often but irregularly. Every candidate sequence (1..=4 bytes) is ranked by
//!
//! ```text
//! score = occurrences * length / (CV + 0.1)
//! ```
//!
//! where CV is the coefficient of variation of the gaps between consecutive
//! occurrences. Non-printable sequences compete for the frame and segment
//! levels (coarsest and finest regular boundary respectively); separator
//! punctuation competes for the field level. Streams without any control
//! boundary fall back to printable punctuation that closes the buffer,
//! e.g. `#` or `;` command terminators.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use proto_model::encoding::code_units;
use proto_model::terminator::{display_name_in, SOH, STX};
use proto_model::{EncodingKind, TerminatorCandidate, TerminatorHierarchy};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Bytes that may form a field delimiter
pub const FIELD_SEPARATORS: [u8; 7] = [b',', b';', b'\t', b' ', b'|', b':', b'='];

/// Relative mean-gap tolerance when grouping candidates into a level
const GAP_TOLERANCE: f64 = 0.1;
/// Regularity (1 / (1 + CV)) a boundary needs to compete for a level
const MIN_REGULARITY: f64 = 0.5;

/// Terminator detection parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerminatorConfig {
    /// Sequences occurring fewer times are discarded
    pub min_occurrences: usize,
    /// Longest sequence considered, in bytes
    pub max_sequence_len: usize,
    /// Minimum score for a candidate to be accepted
    pub min_score: f64,
    /// Only the first this-many bytes are scanned
    pub scan_limit: usize,
}

impl Default for TerminatorConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 5,
            max_sequence_len: 4,
            min_score: 10.0,
            scan_limit: 1 << 20,
        }
    }
}

/// A sequence with its spacing statistics
#[derive(Debug, Clone)]
struct Scored {
    bytes: Vec<u8>,
    occurrences: usize,
    mean_gap: f64,
    cv: f64,
    score: f64,
}

impl Scored {
    fn regularity(&self) -> f64 {
        1.0 / (1.0 + self.cv)
    }

    /// Boundary confidence: spacing regularity, or the share of units it
    /// terminates when that is higher
    ///
    /// Variable-length messages all closed by CRLF are irregular but still
    /// certain.
    fn boundary_confidence(&self, data: &[u8]) -> f64 {
        self.regularity().max(termination_share(data, &self.bytes))
    }

    fn is_start(&self) -> bool {
        matches!(self.bytes.first(), Some(&SOH) | Some(&STX))
    }

    fn to_candidate(
        &self,
        encoding: EncodingKind,
        confidence: f64,
        frequency: f64,
    ) -> TerminatorCandidate {
        TerminatorCandidate {
            display_name: display_name_in(encoding, &self.bytes),
            frequency: frequency.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            occurrences: self.occurrences,
            mean_gap: self.mean_gap,
            score: self.score,
            ..TerminatorCandidate::new(self.bytes.clone())
        }
    }
}

/// Score desc, then length desc, then bytes asc
fn rank(a: &Scored, b: &Scored) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.bytes.len().cmp(&a.bytes.len()))
        .then_with(|| a.bytes.cmp(&b.bytes))
}

/// Positions of every eligible sequence, keyed by its bytes
type Occurrences = BTreeMap<Vec<u8>, Vec<usize>>;

fn record(map: &mut Occurrences, seq: &[u8], pos: usize) {
    if let Some(positions) = map.get_mut(seq) {
        positions.push(pos);
    } else {
        map.insert(seq.to_vec(), vec![pos]);
    }
}

/// Whether a code unit may appear in a frame/segment terminator
fn is_boundary_unit(unit: u32, encoding: EncodingKind, first: bool) -> bool {
    if unit == 0 || unit == u32::from(b'\t') {
        return false;
    }
    if !first && (unit == u32::from(SOH) || unit == u32::from(STX)) {
        return false;
    }
    // High bytes are text in every encoding except the ASCII fallback
    unit < 0x20
        || unit == 0x7F
        || (encoding == EncodingKind::Ascii && (0x80..=0xFF).contains(&unit))
}

/// Printable punctuation that may close messages in a control-free stream
fn is_printable_boundary_unit(unit: u32) -> bool {
    u8::try_from(unit).is_ok_and(|b| b.is_ascii_punctuation())
}

fn is_field_unit(unit: u32) -> bool {
    u8::try_from(unit).is_ok_and(|b| FIELD_SEPARATORS.contains(&b))
}

/// Count non-overlapping occurrences of `needle` in `haystack`
pub(crate) fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() || haystack.len() < needle.len() {
        return 0;
    }
    let mut count = 0;
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if &haystack[i..i + needle.len()] == needle {
            count += 1;
            i += needle.len();
        } else {
            i += 1;
        }
    }
    count
}

/// Share of occurrences of `terminator` that close a non-empty unit
///
/// Zero unless the buffer ends with `terminator`; a trailing partial
/// message means the sequence is not known to terminate every unit.
fn termination_share(data: &[u8], terminator: &[u8]) -> f64 {
    if terminator.is_empty() || !data.ends_with(terminator) {
        return 0.0;
    }
    let occurrences = count_occurrences(data, terminator);
    if occurrences == 0 {
        return 0.0;
    }
    let units = split_units(data, terminator).len();
    (units as f64 / occurrences as f64).min(1.0)
}

/// Split `data` on every occurrence of `separator`, dropping empty parts
pub(crate) fn split_units<'a>(data: &'a [u8], separator: &[u8]) -> Vec<&'a [u8]> {
    if separator.is_empty() {
        return vec![data];
    }
    let mut units = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + separator.len() <= data.len() {
        if &data[i..i + separator.len()] == separator {
            units.push(&data[start..i]);
            i += separator.len();
            start = i;
        } else {
            i += 1;
        }
    }
    units.push(&data[start..]);
    units.retain(|u| !u.is_empty());
    units
}

/// Stateless terminator hierarchy detector
#[derive(Debug, Clone, Default)]
pub struct TerminatorDetector {
    config: TerminatorConfig,
}

impl TerminatorDetector {
    /// Create a detector with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom configuration
    pub fn with_config(config: TerminatorConfig) -> Self {
        Self { config }
    }

    /// Detect frame, segment and field-delimiter levels
    ///
    /// `data` must not include a byte-order mark.
    pub fn detect(&self, data: &[u8], encoding: EncodingKind) -> TerminatorHierarchy {
        let data = &data[..data.len().min(self.config.scan_limit)];
        if data.is_empty() {
            return TerminatorHierarchy::default();
        }

        let (boundary_map, field_map, printable_map) = self.collect(data, encoding);
        let mut boundaries = self.score_all(boundary_map);
        let mut separators = self.score_all(field_map);
        boundaries.sort_by(rank);
        separators.sort_by(rank);

        for s in boundaries.iter().chain(separators.iter()).take(16) {
            trace!(
                "candidate {:02X?}: n={} gap={:.1} cv={:.3} score={:.1}",
                s.bytes,
                s.occurrences,
                s.mean_gap,
                s.cv,
                s.score
            );
        }

        // Printable-only streams (e.g. `#`-terminated readings) have no
        // control boundary; punctuation closing the buffer bounds the frames
        if boundaries.is_empty() {
            let mut closing: Vec<Scored> = self
                .score_all(printable_map)
                .into_iter()
                .filter(|s| data.ends_with(&s.bytes))
                .collect();
            closing.sort_by(rank);
            if let Some(terminator) = closing.into_iter().next() {
                separators.retain(|s| !overlaps(&s.bytes, &terminator.bytes));
                debug!(
                    "No control-character boundary, using trailing {:02X?} as frame terminator",
                    terminator.bytes
                );
                boundaries.push(terminator);
            }
        }

        // Otherwise the strongest separator is promoted
        if boundaries.is_empty() && !separators.is_empty() {
            let promoted = separators.remove(0);
            separators.retain(|s| !overlaps(&s.bytes, &promoted.bytes));
            debug!(
                "No control-character boundary, promoting {:02X?} to frame level",
                promoted.bytes
            );
            boundaries.push(promoted);
        }

        let segment = select_level(&boundaries, Granularity::Finest, None);
        let frame = select_level(&boundaries, Granularity::Coarsest, segment);
        let frame_start = frame.and_then(|f| select_frame_start(&boundaries, f));

        let unit_separator = segment.or(frame).map(|s| s.bytes.as_slice());
        let units = match unit_separator {
            Some(sep) => split_units(data, sep),
            None => vec![data],
        };
        let field = separators.first();

        let hierarchy = TerminatorHierarchy {
            frame: frame.map(|f| {
                f.to_candidate(encoding, f.boundary_confidence(data), coverage(f, data.len()))
            }),
            segment: segment.map(|s| {
                s.to_candidate(encoding, s.boundary_confidence(data), coverage(s, data.len()))
            }),
            field_delimiter: field.map(|f| {
                let (consistency, frequency) = unit_consistency(&units, &f.bytes);
                f.to_candidate(encoding, 0.5 * f.regularity() + 0.5 * consistency, frequency)
            }),
            frame_start: frame_start
                .map(|s| s.to_candidate(encoding, s.regularity(), coverage(s, data.len()))),
        };

        debug!(
            "Hierarchy: frame={:?} segment={:?} field={:?} start={:?}",
            hierarchy.frame.as_ref().map(|c| c.display_name.as_str()),
            hierarchy.segment.as_ref().map(|c| c.display_name.as_str()),
            hierarchy.field_delimiter.as_ref().map(|c| c.display_name.as_str()),
            hierarchy.frame_start.as_ref().map(|c| c.display_name.as_str()),
        );

        hierarchy
    }

    /// Gather positions of every sequence eligible for the boundary, field
    /// and printable-boundary alphabets
    fn collect(
        &self,
        data: &[u8],
        encoding: EncodingKind,
    ) -> (Occurrences, Occurrences, Occurrences) {
        let unit = encoding.code_unit_size();
        let max_len = self.config.max_sequence_len.max(unit);
        let mut boundary = Occurrences::new();
        let mut field = Occurrences::new();
        let mut printable = Occurrences::new();

        let mut pos = 0;
        while pos + unit <= data.len() {
            let mut boundary_ok = true;
            let mut field_ok = true;
            let mut printable_ok = true;
            let mut has_non_space = false;
            let mut len = unit;

            while len <= max_len && pos + len <= data.len() {
                let Some(&value) = code_units(encoding, &data[pos + len - unit..pos + len]).first()
                else {
                    break;
                };
                boundary_ok &= is_boundary_unit(value, encoding, len == unit);
                field_ok &= is_field_unit(value);
                printable_ok &= is_printable_boundary_unit(value);
                has_non_space |= value != u32::from(b' ');

                if !boundary_ok && !field_ok && !printable_ok {
                    break;
                }

                let seq = &data[pos..pos + len];
                if boundary_ok {
                    record(&mut boundary, seq, pos);
                } else if field_ok && has_non_space {
                    record(&mut field, seq, pos);
                }
                if printable_ok {
                    record(&mut printable, seq, pos);
                }
                len += unit;
            }
            pos += unit;
        }

        (boundary, field, printable)
    }

    fn score_all(&self, map: Occurrences) -> Vec<Scored> {
        map.into_iter()
            .filter_map(|(bytes, positions)| self.score(bytes, &positions))
            .collect()
    }

    /// Spacing statistics of one sequence, or `None` if it is rejected
    fn score(&self, bytes: Vec<u8>, positions: &[usize]) -> Option<Scored> {
        let len = bytes.len();
        let mut kept: Vec<usize> = Vec::with_capacity(positions.len());
        for &p in positions {
            if kept.last().is_none_or(|&last| p >= last + len) {
                kept.push(p);
            }
        }

        if kept.len() < self.config.min_occurrences || kept.len() < 2 {
            return None;
        }

        let gaps: Vec<f64> = kept.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
        let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / gaps.len() as f64;
        let cv = if mean > 0.0 { variance.sqrt() / mean } else { 0.0 };
        let score = (kept.len() * len) as f64 / (cv + 0.1);

        (score >= self.config.min_score).then_some(Scored {
            bytes,
            occurrences: kept.len(),
            mean_gap: mean,
            cv,
            score,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Coarsest,
    Finest,
}

/// Pick the best-ranked candidate whose mean gap is near the extreme
///
/// `ranked` must already be sorted by [`rank`]. Candidates straddling the
/// `finer` terminator are excluded.
fn select_level<'a>(
    ranked: &'a [Scored],
    granularity: Granularity,
    finer: Option<&Scored>,
) -> Option<&'a Scored> {
    let regular: Vec<&Scored> = ranked
        .iter()
        .filter(|s| s.regularity() >= MIN_REGULARITY)
        .filter(|s| finer.is_none_or(|f| !straddles(&s.bytes, &f.bytes)))
        .collect();
    let pool: Vec<&Scored> = if regular.is_empty() {
        ranked
            .iter()
            .filter(|s| finer.is_none_or(|f| !straddles(&s.bytes, &f.bytes)))
            .collect()
    } else {
        regular
    };

    // Start markers open frames; prefer real terminators when there are any
    let closing: Vec<&Scored> = pool.iter().copied().filter(|s| !s.is_start()).collect();
    let pool = if closing.is_empty() { pool } else { closing };

    let extreme = match granularity {
        Granularity::Coarsest => pool.iter().map(|s| s.mean_gap).fold(f64::MIN, f64::max),
        Granularity::Finest => pool.iter().map(|s| s.mean_gap).fold(f64::MAX, f64::min),
    };

    pool.into_iter().find(|s| match granularity {
        Granularity::Coarsest => s.mean_gap >= extreme * (1.0 - GAP_TOLERANCE),
        Granularity::Finest => s.mean_gap <= extreme * (1.0 + GAP_TOLERANCE),
    })
}

fn select_frame_start<'a>(ranked: &'a [Scored], frame: &Scored) -> Option<&'a Scored> {
    ranked.iter().find(|s| {
        s.is_start()
            && s.bytes != frame.bytes
            && (s.mean_gap - frame.mean_gap).abs() <= frame.mean_gap * GAP_TOLERANCE
    })
}

/// Whether `bytes` begins with the tail of `finer` and continues into
/// something other than another `finer`
///
/// `"\n" ETX "\r\n"` straddles `"\r\n"`; `"\r\n\r\n"` does not.
fn straddles(bytes: &[u8], finer: &[u8]) -> bool {
    if bytes == finer {
        return false;
    }
    (1..bytes.len()).any(|split| {
        let (head, tail) = bytes.split_at(split);
        finer.ends_with(head) && !tail.starts_with(finer)
    })
}

/// Whether one sequence contains the other
fn overlaps(a: &[u8], b: &[u8]) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    long.windows(short.len()).any(|w| w == short)
}

/// Share of the buffer spanned by a candidate's occurrences
fn coverage(s: &Scored, data_len: usize) -> f64 {
    if data_len == 0 {
        0.0
    } else {
        s.occurrences as f64 * s.mean_gap / data_len as f64
    }
}

/// (consistency, frequency) of a field delimiter across structural units
///
/// Consistency is the share of units whose occurrence count equals the most
/// common non-zero count; frequency is the share of units containing it.
fn unit_consistency(units: &[&[u8]], delimiter: &[u8]) -> (f64, f64) {
    if units.is_empty() {
        return (0.0, 0.0);
    }
    let counts: Vec<usize> = units
        .iter()
        .map(|u| count_occurrences(u, delimiter))
        .collect();

    let mut histogram: BTreeMap<usize, usize> = BTreeMap::new();
    for &c in counts.iter().filter(|&&c| c > 0) {
        *histogram.entry(c).or_default() += 1;
    }
    let Some((_, modal_units)) = histogram
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
    else {
        return (0.0, 0.0);
    };

    let containing = counts.iter().filter(|&&c| c > 0).count();
    (
        *modal_units as f64 / units.len() as f64,
        containing as f64 / units.len() as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat(frame: &[u8], n: usize) -> Vec<u8> {
        frame.repeat(n)
    }

    #[test]
    fn test_crlf_frames() {
        let data = repeat(b"   0.360 kg    G\r\n", 20);
        let h = TerminatorDetector::new().detect(&data, EncodingKind::Ascii);

        let frame = h.frame.unwrap();
        assert_eq!(frame.bytes, b"\r\n");
        assert_eq!(frame.display_name, "CRLF");
        assert!((frame.confidence - 1.0).abs() < 1e-9);
        assert_eq!(h.segment.unwrap().bytes, b"\r\n");
        assert!(h.field_delimiter.is_none());
    }

    #[test]
    fn test_common_two_byte_suffix_variable_lengths() {
        let messages: [&[u8]; 6] = [
            b"ID019;\r\n",
            b"FA00014250000;\r\n",
            b"MD2;\r\n",
            b"FB00007074000;\r\n",
            b"IF00014250000;\r\n",
            b"TX0;\r\n",
        ];
        let data: Vec<u8> = messages.iter().flat_map(|m| m.iter().copied()).collect();
        let data = data.repeat(3);
        let h = TerminatorDetector::new().detect(&data, EncodingKind::Ascii);
        let segment = h.segment.unwrap();
        assert_eq!(segment.bytes, b"\r\n");
        assert!((segment.confidence - 1.0).abs() < 0.05);
        assert!((h.frame.unwrap().confidence - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_truncated_tail_falls_back_to_regularity() {
        let mut data = repeat(b"ID019;\r\nFA00014250000;\r\nTX0;\r\n", 4);
        data.extend_from_slice(b"FA000142");
        let h = TerminatorDetector::new().detect(&data, EncodingKind::Ascii);
        let segment = h.segment.unwrap();
        assert_eq!(segment.bytes, b"\r\n");
        assert!(segment.confidence < 0.9);
    }

    #[test]
    fn test_termination_share() {
        assert_eq!(termination_share(b"a\r\nbb\r\nccc\r\n", b"\r\n"), 1.0);
        assert_eq!(termination_share(b"a\r\n\r\nb\r\n", b"\r\n"), 2.0 / 3.0);
        assert_eq!(termination_share(b"a\r\nb\r\nc", b"\r\n"), 0.0);
    }

    #[test]
    fn test_comma_delimiter_with_consistent_counts() {
        let data = repeat(b"ST,GS,+0001.94kg\r\n", 12);
        let h = TerminatorDetector::new().detect(&data, EncodingKind::Ascii);
        let field = h.field_delimiter.unwrap();
        assert_eq!(field.bytes, b",");
        assert!(field.is_confident());
        assert_eq!(field.frequency, 1.0);
    }

    #[test]
    fn test_stx_etx_multiline_frames() {
        let mut frame = vec![STX];
        frame.extend_from_slice(b"GROSS  12.50\r\nTARE    0.50\r\nNET    12.00\r\n");
        frame.push(0x03);
        frame.extend_from_slice(b"\r\n");
        let data = repeat(&frame, 10);

        let h = TerminatorDetector::new().detect(&data, EncodingKind::Ascii);
        let frame = h.frame.unwrap();
        assert_eq!(frame.bytes.first(), Some(&0x03));
        assert_eq!(h.segment.unwrap().bytes, b"\r\n");
        assert_eq!(h.frame_start.unwrap().bytes, vec![STX]);
    }

    #[test]
    fn test_semicolon_stream_promotes_separator() {
        let data = repeat(b"FA00014250000;", 10);
        let h = TerminatorDetector::new().detect(&data, EncodingKind::Ascii);
        assert_eq!(h.frame.unwrap().bytes, b";");
        assert!(h.field_delimiter.is_none());
    }

    #[test]
    fn test_printable_terminator_closing_the_stream() {
        let mut data = Vec::new();
        for i in 0..12u32 {
            data.extend_from_slice(format!("ST,GS,+0001.{:02}kg#", 10 + i * 3).as_bytes());
        }
        let h = TerminatorDetector::new().detect(&data, EncodingKind::Ascii);

        let frame = h.frame.unwrap();
        assert_eq!(frame.bytes, b"#");
        assert!(frame.is_confident());
        assert_eq!(h.segment.unwrap().bytes, b"#");
        let field = h.field_delimiter.unwrap();
        assert_eq!(field.bytes, b",");
        assert_eq!(field.frequency, 1.0);
    }

    #[test]
    fn test_control_boundary_beats_trailing_punctuation() {
        let data = repeat(b"A,1;\r\n", 10);
        let h = TerminatorDetector::new().detect(&data, EncodingKind::Ascii);
        assert_eq!(h.frame.unwrap().bytes, b"\r\n");
    }

    #[test]
    fn test_utf16le_crlf_is_aligned() {
        let data = proto_model::encode(EncodingKind::Utf16Le, &"A,1,2\r\n".repeat(10));
        let h = TerminatorDetector::new().detect(&data, EncodingKind::Utf16Le);
        assert_eq!(h.frame.unwrap().bytes, vec![0x0D, 0x00, 0x0A, 0x00]);
        let field = h.field_delimiter.unwrap();
        assert_eq!(field.bytes, vec![b',', 0x00]);
        assert_eq!(field.display_name, "','");
    }

    #[test]
    fn test_too_few_occurrences() {
        let h = TerminatorDetector::new().detect(b"a\r\nb\r\nc\r\n", EncodingKind::Ascii);
        assert!(h.frame.is_none());
        assert!(h.segment.is_none());
    }

    #[test]
    fn test_straddling() {
        assert!(straddles(b"\n\x03\r\n", b"\r\n"));
        assert!(straddles(b"\r\n\x03", b"\r\n"));
        assert!(!straddles(b"\x03\r\n", b"\r\n"));
        assert!(!straddles(b"\r\n\r\n", b"\r\n"));
    }

    #[test]
    fn test_blank_line_blocks() {
        let data = repeat(b"W: 12.5\r\nT: 0.5\r\n\r\n", 8);
        let h = TerminatorDetector::new().detect(&data, EncodingKind::Ascii);
        assert_eq!(h.segment.unwrap().bytes, b"\r\n");
        assert_eq!(h.frame.unwrap().bytes, b"\r\n\r\n");
    }

    #[test]
    fn test_split_units_and_count() {
        assert_eq!(split_units(b"a,b,,c,", b","), vec![&b"a"[..], b"b", b"c"]);
        assert_eq!(count_occurrences(b"aaaa", b"aa"), 2);
    }
}
