//! Coordinator counters.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters for a [`GenerationCoordinator`](crate::GenerationCoordinator).
#[derive(Debug, Clone, Default)]
pub struct CoordinatorMetrics {
    inner: Arc<CoordinatorMetricsInner>,
}

#[derive(Debug, Default)]
struct CoordinatorMetricsInner {
    tickets_created: AtomicU64,
    waiters_attached: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
}

/// Point-in-time copy of [`CoordinatorMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Generations started (one per leader)
    pub tickets_created: u64,
    /// Requests that joined an in-flight generation
    pub waiters_attached: u64,
    /// Generations that produced a value
    pub successes: u64,
    /// Generations that failed, timeouts included
    pub failures: u64,
    /// Generations that exceeded the deadline
    pub timeouts: u64,
}

impl CoordinatorMetrics {
    pub(crate) fn record_ticket(&self) {
        self.inner.tickets_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_waiter(&self) {
        self.inner.waiters_attached.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self) {
        self.inner.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.inner.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.inner.timeouts.fetch_add(1, Ordering::Relaxed);
        self.record_failure();
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tickets_created: self.inner.tickets_created.load(Ordering::Relaxed),
            waiters_attached: self.inner.waiters_attached.load(Ordering::Relaxed),
            successes: self.inner.successes.load(Ordering::Relaxed),
            failures: self.inner.failures.load(Ordering::Relaxed),
            timeouts: self.inner.timeouts.load(Ordering::Relaxed),
        }
    }
}
