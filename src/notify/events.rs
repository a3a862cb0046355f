//! Event payloads published by the scheduler.

use crate::diff::DiffResult;
use crate::error::FetchError;
use crate::sources::Resource;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// A resource was observed for the first time, or its content changed.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    /// The descriptor that was fetched.
    pub resource: Resource,
    /// The address the descriptor resolves to.
    pub url: String,
    /// Diff between the previous snapshot (or the empty string) and `body`.
    pub diff: DiffResult,
    /// The raw fetched content.
    pub body: String,
    /// True on the first successful fetch since the resource was last forgotten.
    pub is_initial_diff: bool,
    /// When the fetch completed.
    pub observed_at: DateTime<Utc>,
}

/// Fetching a resource failed.
///
/// Serializes `error` as its display string.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    /// The descriptor that was fetched.
    pub resource: Resource,
    /// The address the descriptor resolves to.
    pub url: String,
    /// The failure reported by the fetcher, untouched.
    #[serde(serialize_with = "serialize_error")]
    pub error: Arc<FetchError>,
    /// When the fetch failed.
    pub observed_at: DateTime<Utc>,
}

fn serialize_error<S: Serializer>(error: &Arc<FetchError>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}
