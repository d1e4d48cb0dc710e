//! Package, segment and field extraction
//!
//! Everything here borrows from the input buffer; packages are discarded
//! once their fields have been sampled.

use proto_model::{FrameMarkers, TerminatorHierarchy};

/// A byte slice bounded by frame markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Package<'a> {
    /// Position in the stream, 0-based
    pub index: usize,
    pub bytes: &'a [u8],
}

/// Fields of one package, grouped by segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout<'a> {
    pub segments: Vec<Vec<&'a [u8]>>,
}

impl<'a> PackageLayout<'a> {
    /// Fields of every segment, in order
    pub fn fields(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.segments.iter().flatten().copied()
    }

    pub fn field_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }
}

/// Derive package markers from the detected hierarchy
///
/// A frame terminator opening with SOH/STX starts packages; any other
/// frame terminator ends them.
pub fn frame_markers(hierarchy: &TerminatorHierarchy) -> FrameMarkers {
    let mut markers = FrameMarkers {
        start: hierarchy.frame_start.as_ref().map(|s| s.bytes.clone()),
        end: None,
    };
    if let Some(frame) = &hierarchy.frame {
        if frame.is_start_marker() {
            markers.start.get_or_insert_with(|| frame.bytes.clone());
        } else {
            markers.end = Some(frame.bytes.clone());
        }
    }
    markers
}

/// Position of the first occurrence of `needle` at or after `from`
pub(crate) fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Split on `separator`, keeping empty parts
fn split_exact<'a>(data: &'a [u8], separator: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut cursor = 0;
    while let Some(pos) = find(data, separator, cursor) {
        parts.push(&data[cursor..pos]);
        cursor = pos + separator.len();
    }
    parts.push(&data[cursor..]);
    parts
}

/// Split the stream into packages using the known markers
///
/// With no markers the whole buffer is one package.
pub fn split_packages<'a>(data: &'a [u8], markers: &FrameMarkers) -> Vec<Package<'a>> {
    let slices = match (&markers.start, &markers.end) {
        (Some(start), end) => split_on_start(data, start, end.as_deref()),
        (None, Some(end)) => split_on_end(data, end),
        (None, None) => vec![data],
    };
    slices
        .into_iter()
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(index, bytes)| Package { index, bytes })
        .collect()
}

fn split_on_start<'a>(data: &'a [u8], start: &[u8], end: Option<&[u8]>) -> Vec<&'a [u8]> {
    let mut positions = Vec::new();
    let mut cursor = 0;
    while let Some(pos) = find(data, start, cursor) {
        positions.push(pos);
        cursor = pos + start.len();
    }

    positions
        .iter()
        .enumerate()
        .map(|(i, &pos)| {
            let body_start = pos + start.len();
            let body_end = positions.get(i + 1).copied().unwrap_or(data.len());
            let body = &data[body_start..body_end];
            match end.and_then(|e| find(body, e, 0)) {
                Some(cut) => &body[..cut],
                None => body,
            }
        })
        .collect()
}

fn split_on_end<'a>(data: &'a [u8], end: &[u8]) -> Vec<&'a [u8]> {
    // The trailing remainder, if any, is a partial package
    split_exact(data, end)
}

/// Split a package into segments, dropping empty ones
pub fn split_segments<'a>(package: &'a [u8], segment: Option<&[u8]>) -> Vec<&'a [u8]> {
    match segment {
        Some(sep) if !sep.is_empty() => split_exact(package, sep)
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect(),
        _ => vec![package],
    }
}

/// Split a segment into fields by exact match, keeping empty fields
///
/// Without a delimiter the whole segment is one field.
pub fn split_fields<'a>(segment: &'a [u8], delimiter: Option<&[u8]>) -> Vec<&'a [u8]> {
    match delimiter {
        Some(d) if !d.is_empty() => split_exact(segment, d),
        _ => vec![segment],
    }
}

/// Segment and field layout of one package
pub fn layout<'a>(
    package: &Package<'a>,
    segment: Option<&[u8]>,
    delimiter: Option<&[u8]>,
) -> PackageLayout<'a> {
    PackageLayout {
        segments: split_segments(package.bytes, segment)
            .into_iter()
            .map(|s| split_fields(s, delimiter))
            .collect(),
    }
}
