//! Generation dedup for img10.
//!
//! Rendering a thumbnail is expensive and requests for the same
//! (asset, spec) pair tend to arrive together. [`GenerationCoordinator`]
//! keeps a ticket table keyed by that pair so each generation runs once and
//! every concurrent requester receives its result.
//!
//! The ticket table only tracks work in flight. Completed results live in
//! the metadata index and storage; callers consult those first.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod coordinator;
mod metrics;

pub use coordinator::GenerationCoordinator;
pub use metrics::{CoordinatorMetrics, MetricsSnapshot};
