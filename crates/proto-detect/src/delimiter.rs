//! Field delimiter detection over already-separated messages

use proto_model::terminator::display_name;
use proto_model::{encode, EncodingKind, TerminatorCandidate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::terminator::count_occurrences;

/// Delimiters tried, in tie-break order
pub const DELIMITER_CANDIDATES: [char; 7] = [',', ';', '\t', ' ', '|', ':', '='];

/// Confidence when the delimiter averages more than one per message
pub const STRUCTURAL_CONFIDENCE: f64 = 0.9;
/// Confidence when it appears at most once per message on average
pub const INCIDENTAL_CONFIDENCE: f64 = 0.5;

/// A delimiter with its occurrence statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelimiterCandidate {
    pub delimiter: char,
    /// Delimiter bytes in the analysed encoding
    pub bytes: Vec<u8>,
    pub total_occurrences: usize,
    pub average_per_message: f64,
    pub confidence: f64,
}

impl DelimiterCandidate {
    /// Express as a field-level terminator candidate
    pub fn to_terminator(&self) -> TerminatorCandidate {
        TerminatorCandidate {
            display_name: display_name(self.delimiter.to_string().as_bytes()),
            occurrences: self.total_occurrences,
            ..TerminatorCandidate::with_confidence(self.bytes.clone(), self.confidence)
        }
    }
}

/// Picks the most plausible field delimiter across a set of messages
#[derive(Debug, Clone, Default)]
pub struct DelimiterDetector;

impl DelimiterDetector {
    /// Create a delimiter detector
    pub fn new() -> Self {
        Self
    }

    /// Score every candidate delimiter that occurs at least once
    pub fn candidates(
        &self,
        messages: &[&[u8]],
        encoding: EncodingKind,
    ) -> Vec<DelimiterCandidate> {
        if messages.is_empty() {
            return Vec::new();
        }

        DELIMITER_CANDIDATES
            .iter()
            .filter_map(|&delimiter| {
                let bytes = encode(encoding, &delimiter.to_string());
                let total: usize = messages
                    .iter()
                    .map(|m| count_occurrences(m, &bytes))
                    .sum();
                if total == 0 {
                    return None;
                }
                let average = total as f64 / messages.len() as f64;
                Some(DelimiterCandidate {
                    delimiter,
                    bytes,
                    total_occurrences: total,
                    average_per_message: average,
                    confidence: if average > 1.0 {
                        STRUCTURAL_CONFIDENCE
                    } else {
                        INCIDENTAL_CONFIDENCE
                    },
                })
            })
            .collect()
    }

    /// Best delimiter by confidence, then total occurrences
    ///
    /// Ties keep the earlier entry of [`DELIMITER_CANDIDATES`].
    pub fn detect(&self, messages: &[&[u8]], encoding: EncodingKind) -> Option<DelimiterCandidate> {
        let mut best: Option<DelimiterCandidate> = None;
        for candidate in self.candidates(messages, encoding) {
            let better = best.as_ref().is_none_or(|b| {
                candidate
                    .confidence
                    .total_cmp(&b.confidence)
                    .then(candidate.total_occurrences.cmp(&b.total_occurrences))
                    .is_gt()
            });
            if better {
                best = Some(candidate);
            }
        }

        if let Some(b) = &best {
            debug!(
                "Delimiter {:?}: {} occurrences, {:.2}/message",
                b.delimiter, b.total_occurrences, b.average_per_message
            );
        }
        best
    }
}
