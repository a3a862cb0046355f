//! Built-in metrics for polling operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Fetch cycles started
//! - Fetch attempts/failures
//! - Fetch duration
//! - Change events emitted
//!
//! # Examples
//!
//! ```rust,no_run
//! use pollwatch::prelude::*;
//! use opentelemetry::global;
//!
//! # fn example() -> Result<()> {
//! let scheduler = Scheduler::builder()
//!     .with_resource("https://example.com/status")
//!     .with_metrics(global::meter("my-app"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod poller_metrics;

pub use poller_metrics::PollerMetrics;
