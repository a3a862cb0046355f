//! # pollwatch
//!
//! Periodic polling of remote resources with per-resource change detection.
//!
//! ## Overview
//!
//! `pollwatch` fetches a list of resources on a fixed interval, diffs each
//! fetched body against the previous one, and notifies subscribers:
//! - A [`ChangeEvent`](notify::ChangeEvent) on the first observation of a
//!   resource and whenever its content gains or loses lines
//! - An [`ErrorEvent`](notify::ErrorEvent) whenever a fetch fails
//!
//! Diffs are line based and ignore leading/trailing whitespace, so
//! reformatting alone never counts as a change.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pollwatch::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> pollwatch::error::Result<()> {
//! let scheduler = Scheduler::builder()
//!     .with_interval(Duration::from_secs(60))
//!     .with_resource("https://example.com/status")
//!     .build()?;
//!
//! scheduler
//!     .on_change(|event| {
//!         println!("{} changed, initial = {}", event.url, event.is_initial_diff);
//!     })
//!     .detach();
//!
//! scheduler
//!     .on_error(|event| eprintln!("{} failed: {}", event.url, event.error))
//!     .detach();
//!
//! scheduler.start()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `http` (default): [`HttpFetcher`](sources::HttpFetcher), the default fetcher
//! - `metrics`: OpenTelemetry metrics for cycles, fetches and changes

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod diff;
pub mod error;
pub mod notify;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ChangeTracker, Scheduler, SchedulerBuilder, SchedulerState};
    pub use crate::diff::{DiffResult, Differ, SegmentKind, TrimmedLineDiff};
    pub use crate::error::{FetchError, Result, SchedulerError};
    pub use crate::notify::{ChangeEvent, ErrorEvent, SubscriptionHandle};
    pub use crate::sources::{Fetcher, Resource, fetch_fn};
}
