//! Structured line diffs.
//!
//! A [`DiffResult`] is an ordered list of segments tagged as unchanged, added
//! or removed. The [`Differ`] trait is the seam through which the change
//! tracker computes diffs; [`TrimmedLineDiff`] is the default implementation.

mod trimmed;

pub use trimmed::TrimmedLineDiff;

use serde::Serialize;

/// How a segment relates the previous content to the new content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Lines present in both versions.
    Unchanged,
    /// Lines only present in the new version.
    Added,
    /// Lines only present in the previous version.
    Removed,
}

/// A run of consecutive lines sharing the same [`SegmentKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSegment {
    /// Segment tag.
    pub kind: SegmentKind,
    /// Original text of the lines, line terminators included.
    pub value: String,
    /// Number of lines in `value`.
    pub count: usize,
}

impl DiffSegment {
    /// Whether this segment adds lines.
    pub fn is_added(&self) -> bool {
        self.kind == SegmentKind::Added
    }

    /// Whether this segment removes lines.
    pub fn is_removed(&self) -> bool {
        self.kind == SegmentKind::Removed
    }
}

/// Ordered sequence of diff segments.
///
/// Unchanged segments carry the text of the new version, so concatenating
/// every segment except the removed ones yields the new content exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiffResult {
    segments: Vec<DiffSegment>,
}

impl DiffResult {
    /// Wrap an already computed list of segments.
    pub fn new(segments: Vec<DiffSegment>) -> Self {
        Self { segments }
    }

    /// The segments in order.
    pub fn segments(&self) -> &[DiffSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when there are no segments at all (both sides were empty).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when at least one segment adds or removes lines.
    pub fn has_changes(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| segment.is_added() || segment.is_removed())
    }

    /// Total number of added lines.
    pub fn added_lines(&self) -> usize {
        self.count_lines(SegmentKind::Added)
    }

    /// Total number of removed lines.
    pub fn removed_lines(&self) -> usize {
        self.count_lines(SegmentKind::Removed)
    }

    /// Rebuild the new content from the unchanged and added segments.
    pub fn new_text(&self) -> String {
        self.segments
            .iter()
            .filter(|segment| !segment.is_removed())
            .map(|segment| segment.value.as_str())
            .collect()
    }

    /// Iterate over the segments.
    pub fn iter(&self) -> std::slice::Iter<'_, DiffSegment> {
        self.segments.iter()
    }

    fn count_lines(&self, kind: SegmentKind) -> usize {
        self.segments
            .iter()
            .filter(|segment| segment.kind == kind)
            .map(|segment| segment.count)
            .sum()
    }
}

impl<'a> IntoIterator for &'a DiffResult {
    type Item = &'a DiffSegment;
    type IntoIter = std::slice::Iter<'a, DiffSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Computes a [`DiffResult`] between two texts.
///
/// Implementations must be deterministic: identical inputs always produce the
/// same segments.
pub trait Differ: Send + Sync {
    /// Diff `previous` against `current`.
    fn diff(&self, previous: &str, current: &str) -> DiffResult;
}

impl<F> Differ for F
where
    F: Fn(&str, &str) -> DiffResult + Send + Sync,
{
    fn diff(&self, previous: &str, current: &str) -> DiffResult {
        self(previous, current)
    }
}
