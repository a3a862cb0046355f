//! Line diff that ignores leading and trailing whitespace.

use super::{DiffResult, DiffSegment, Differ, SegmentKind};
use similar::{Algorithm, DiffOp, capture_diff_slices};

/// Line-granular diff comparing lines by their trimmed text.
///
/// Lines keep their terminator (`\n` or `\r\n`) and their original
/// whitespace in the produced segments; only equality ignores it. The edit
/// script is a minimal Myers script over the trimmed lines, computed in
/// linear space. Within a block of changes removed lines always come before
/// added lines.
///
/// # Examples
///
/// ```rust
/// use pollwatch::diff::{Differ, TrimmedLineDiff};
///
/// let diff = TrimmedLineDiff.diff("a\nb\n", "a\n  b  \nc\n");
/// assert_eq!(diff.added_lines(), 1);
/// assert_eq!(diff.removed_lines(), 0);
/// assert_eq!(diff.new_text(), "a\n  b  \nc\n");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimmedLineDiff;

impl Differ for TrimmedLineDiff {
    fn diff(&self, previous: &str, current: &str) -> DiffResult {
        let old_lines = split_lines(previous);
        let new_lines = split_lines(current);
        let old_keys: Vec<&str> = old_lines.iter().map(|line| line.trim()).collect();
        let new_keys: Vec<&str> = new_lines.iter().map(|line| line.trim()).collect();

        let mut builder = SegmentBuilder::default();
        for op in capture_diff_slices(Algorithm::Myers, &old_keys[..], &new_keys[..]) {
            match op {
                DiffOp::Equal { new_index, len, .. } => {
                    builder.push_all(SegmentKind::Unchanged, &new_lines[new_index..new_index + len]);
                }
                DiffOp::Delete {
                    old_index, old_len, ..
                } => {
                    builder.push_all(SegmentKind::Removed, &old_lines[old_index..old_index + old_len]);
                }
                DiffOp::Insert {
                    new_index, new_len, ..
                } => {
                    builder.push_all(SegmentKind::Added, &new_lines[new_index..new_index + new_len]);
                }
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => {
                    builder.push_all(SegmentKind::Removed, &old_lines[old_index..old_index + old_len]);
                    builder.push_all(SegmentKind::Added, &new_lines[new_index..new_index + new_len]);
                }
            }
        }

        builder.finish()
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Accumulates lines into segments, holding back a block of changes until the
/// next unchanged line so removals can be emitted ahead of additions.
#[derive(Default)]
struct SegmentBuilder {
    segments: Vec<DiffSegment>,
    removed: Option<DiffSegment>,
    added: Option<DiffSegment>,
}

impl SegmentBuilder {
    fn push(&mut self, kind: SegmentKind, line: &str) {
        match kind {
            SegmentKind::Unchanged => {
                self.flush_changes();
                match self.segments.last_mut() {
                    Some(last) if last.kind == SegmentKind::Unchanged => extend(last, line),
                    _ => self.segments.push(start(kind, line)),
                }
            }
            SegmentKind::Removed => append(&mut self.removed, kind, line),
            SegmentKind::Added => append(&mut self.added, kind, line),
        }
    }

    fn push_all(&mut self, kind: SegmentKind, lines: &[&str]) {
        for line in lines {
            self.push(kind, line);
        }
    }

    fn flush_changes(&mut self) {
        self.segments.extend(self.removed.take());
        self.segments.extend(self.added.take());
    }

    fn finish(mut self) -> DiffResult {
        self.flush_changes();
        DiffResult::new(self.segments)
    }
}

fn start(kind: SegmentKind, line: &str) -> DiffSegment {
    DiffSegment {
        kind,
        value: line.to_string(),
        count: 1,
    }
}

fn extend(segment: &mut DiffSegment, line: &str) {
    segment.value.push_str(line);
    segment.count += 1;
}

fn append(slot: &mut Option<DiffSegment>, kind: SegmentKind, line: &str) {
    match slot {
        Some(segment) => extend(segment, line),
        None => *slot = Some(start(kind, line)),
    }
}
