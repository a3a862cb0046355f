//! Per-resource content memory and change detection.

use crate::diff::{DiffResult, Differ, TrimmedLineDiff};
use crate::sources::Resource;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Remembers the last content seen for each key and diffs new content against it.
///
/// This is the single authority for "has this resource changed". A key that
/// has never been stored diffs against the empty string. The tracker is an
/// ordinary owned value: each [`Scheduler`](crate::core::Scheduler) gets its
/// own, so independent schedulers never share memory.
///
/// # Examples
///
/// ```rust
/// use pollwatch::core::ChangeTracker;
///
/// let mut tracker: ChangeTracker<&str> = ChangeTracker::new();
/// assert!(!tracker.has(&"page"));
///
/// let first = tracker.diff_and_update(&"page", "hello\n");
/// assert!(first.has_changes());
/// assert!(tracker.has(&"page"));
///
/// let second = tracker.diff_and_update(&"page", "  hello  \n");
/// assert!(!second.has_changes());
/// ```
pub struct ChangeTracker<K = Resource> {
    snapshots: HashMap<K, Arc<str>>,
    differ: Arc<dyn Differ>,
}

impl<K> ChangeTracker<K>
where
    K: Eq + Hash,
{
    /// Create an empty tracker using [`TrimmedLineDiff`].
    pub fn new() -> Self {
        Self::with_differ(TrimmedLineDiff)
    }

    /// Create an empty tracker using a custom diff implementation.
    pub fn with_differ<D: Differ + 'static>(differ: D) -> Self {
        Self {
            snapshots: HashMap::new(),
            differ: Arc::new(differ),
        }
    }

    /// Diff `content` against the stored snapshot for `key` without storing it.
    pub fn diff(&self, key: &K, content: &str) -> DiffResult {
        self.differ.diff(self.get(key).unwrap_or(""), content)
    }

    /// Diff `content` against the stored snapshot, then store `content`.
    ///
    /// Returns the diff computed before the update. The snapshot is replaced
    /// whether or not anything changed.
    pub fn diff_and_update(&mut self, key: &K, content: &str) -> DiffResult
    where
        K: Clone,
    {
        let diff = self.diff(key, content);
        self.snapshots.insert(key.clone(), Arc::from(content));
        diff
    }

    /// True if a snapshot has ever been stored for `key` (and not cleared since).
    pub fn has(&self, key: &K) -> bool {
        self.snapshots.contains_key(key)
    }

    /// The stored snapshot for `key`.
    pub fn get(&self, key: &K) -> Option<&str> {
        self.snapshots.get(key).map(|snapshot| &**snapshot)
    }

    /// A shared handle to the stored snapshot for `key`.
    ///
    /// Lets a caller diff against the snapshot after releasing any lock
    /// around the tracker.
    pub fn snapshot(&self, key: &K) -> Option<Arc<str>> {
        self.snapshots.get(key).cloned()
    }

    /// The diff implementation this tracker uses.
    pub fn differ(&self) -> Arc<dyn Differ> {
        Arc::clone(&self.differ)
    }

    /// Store a snapshot directly, returning the previous one.
    pub fn insert(&mut self, key: K, content: impl Into<Arc<str>>) -> Option<Arc<str>> {
        self.snapshots.insert(key, content.into())
    }

    /// Forget every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Number of keys with a snapshot.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl<K> Default for ChangeTracker<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for ChangeTracker<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("snapshots", &self.snapshots.len())
            .finish_non_exhaustive()
    }
}
