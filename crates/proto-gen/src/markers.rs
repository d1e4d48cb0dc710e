//! Frame marker pattern derivation

/// Regex for a marker line, generalised from its samples
///
/// The longest common prefix is kept literally, and identical samples give
/// just that literal. When every remainder is digits of the same width,
/// digits ending the prefix are folded into the remainder and it becomes
/// `\d{N}`; other remainders become `.*`.
pub fn derive_marker_pattern(samples: &[String]) -> Option<String> {
    let first = samples.first()?;
    let prefix = common_prefix(samples, first);
    if samples.iter().all(|s| s.len() == prefix.len()) {
        return Some(format!("^{}", regex::escape(prefix)));
    }

    // Back off over trailing digits so "REPORT 0012" / "REPORT 0013"
    // yields `REPORT \d{4}` rather than `REPORT 001\d{1}`
    let literal = prefix.trim_end_matches(|c: char| c.is_ascii_digit());
    let remainders: Vec<&str> = samples.iter().map(|s| &s[literal.len()..]).collect();
    if let Some(width) = uniform_digit_width(&remainders) {
        return Some(format!("^{}\\d{{{}}}", regex::escape(literal), width));
    }

    Some(format!("^{}.*", regex::escape(prefix)))
}

fn common_prefix<'a>(samples: &[String], first: &'a str) -> &'a str {
    let mut end = first.len();
    for s in &samples[1..] {
        end = first
            .char_indices()
            .zip(s.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8())
            .min(end);
    }
    &first[..end]
}

fn uniform_digit_width(remainders: &[&str]) -> Option<usize> {
    let width = remainders.first()?.len();
    let uniform = width > 0
        && remainders
            .iter()
            .all(|r| r.len() == width && r.bytes().all(|b| b.is_ascii_digit()));
    uniform.then_some(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_constant_marker() {
        assert_eq!(
            derive_marker_pattern(&strings(&["BEGIN", "BEGIN"])).as_deref(),
            Some("^BEGIN")
        );
    }

    #[test]
    fn test_identical_markers_ending_in_digits_stay_literal() {
        assert_eq!(
            derive_marker_pattern(&strings(&["END1", "END1"])).as_deref(),
            Some("^END1")
        );
        assert_eq!(
            derive_marker_pattern(&strings(&["REPORT 0012"])).as_deref(),
            Some("^REPORT 0012")
        );
    }

    #[test]
    fn test_numbered_marker() {
        let samples = strings(&["REPORT 0012", "REPORT 0013", "REPORT 0020"]);
        assert_eq!(
            derive_marker_pattern(&samples).as_deref(),
            Some(r"^REPORT \d{4}")
        );
    }

    #[test]
    fn test_free_text_remainder() {
        let samples = strings(&["*** Ticket A", "*** Ticket B2"]);
        assert_eq!(
            derive_marker_pattern(&samples).as_deref(),
            Some(r"^\*\*\* Ticket .*")
        );
    }

    #[test]
    fn test_no_samples() {
        assert!(derive_marker_pattern(&[]).is_none());
    }
}
