//! Ticket table ensuring one producer per key.

use crate::{CoordinatorMetrics, MetricsSnapshot};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use img10_error::{Img10Result, ThumbnailError, ThumbnailErrorKind};
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

type SharedOutcome<V> = Shared<BoxFuture<'static, Img10Result<V>>>;

/// In-flight generation for one key.
///
/// Every request for the key awaits a clone of the same shared handle.
struct GenerationTicket<V: Clone> {
    id: u64,
    outcome: SharedOutcome<V>,
    started_at: Instant,
}

/// Single-flight coordinator for expensive, keyed work.
///
/// The first caller for a key becomes the leader: its producer is spawned on
/// the runtime under a deadline and a ticket holding a shared handle to the
/// result is inserted. Callers arriving while the ticket exists attach to
/// that handle instead of producing again.
///
/// The spawned task owns the generation. Dropping any caller, the leader
/// included, never cancels it, and the task removes its own ticket when it
/// finishes, so a request after a failure starts fresh.
///
/// # Examples
///
/// ```
/// use img10_cache::GenerationCoordinator;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let coordinator: GenerationCoordinator<String, u32> =
///     GenerationCoordinator::new(Duration::from_secs(5));
///
/// let value = coordinator
///     .run("answer".to_string(), || async { Ok(42) })
///     .await
///     .unwrap();
/// assert_eq!(value, 42);
/// assert_eq!(coordinator.in_flight(), 0);
/// # }
/// ```
pub struct GenerationCoordinator<K, V: Clone> {
    tickets: Arc<DashMap<K, GenerationTicket<V>>>,
    timeout: Duration,
    next_id: AtomicU64,
    metrics: CoordinatorMetrics,
}

impl<K, V> GenerationCoordinator<K, V>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a coordinator whose generations are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        tracing::debug!(
            timeout_ms = timeout.as_millis() as u64,
            "Creating generation coordinator"
        );
        Self {
            tickets: Arc::new(DashMap::new()),
            timeout,
            next_id: AtomicU64::new(0),
            metrics: CoordinatorMetrics::default(),
        }
    }

    /// Deadline applied to every generation.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `produce` for `key` unless a generation for it is already in flight,
    /// and return the shared outcome either way.
    ///
    /// # Errors
    ///
    /// The producer's error, `Timeout` when the deadline passes, or
    /// `TaskFailed` when the producer panics. Every attached caller receives
    /// the same error.
    pub async fn run<F, Fut>(&self, key: K, produce: F) -> Img10Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Img10Result<V>> + Send + 'static,
    {
        let outcome = match self.tickets.entry(key.clone()) {
            Entry::Occupied(entry) => {
                self.metrics.record_waiter();
                tracing::debug!(
                    %key,
                    ticket = entry.get().id,
                    waited_ms = entry.get().started_at.elapsed().as_millis() as u64,
                    "Attached to in-flight generation"
                );
                entry.get().outcome.clone()
            }
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                self.metrics.record_ticket();
                tracing::debug!(%key, ticket = id, "Starting generation");

                let outcome = self.spawn_generation(key, id, produce);
                entry.insert(GenerationTicket {
                    id,
                    outcome: outcome.clone(),
                    started_at: Instant::now(),
                });
                outcome
            }
        };

        outcome.await
    }

    fn spawn_generation<F, Fut>(&self, key: K, id: u64, produce: F) -> SharedOutcome<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Img10Result<V>> + Send + 'static,
    {
        let tickets = Arc::clone(&self.tickets);
        let metrics = self.metrics.clone();
        let timeout = self.timeout;

        let task = tokio::spawn(async move {
            let guarded = AssertUnwindSafe(async move { produce().await }).catch_unwind();
            let result = match tokio::time::timeout(timeout, guarded).await {
                Ok(Ok(result)) => {
                    match &result {
                        Ok(_) => metrics.record_success(),
                        Err(e) => {
                            metrics.record_failure();
                            tracing::warn!(%key, ticket = id, error = %e, "Generation failed");
                        }
                    }
                    result
                }
                Ok(Err(_panic)) => {
                    metrics.record_failure();
                    tracing::error!(%key, ticket = id, "Generation panicked");
                    Err(ThumbnailError::new(ThumbnailErrorKind::TaskFailed(
                        "producer panicked".to_string(),
                    ))
                    .into())
                }
                Err(_elapsed) => {
                    metrics.record_timeout();
                    tracing::warn!(
                        %key,
                        ticket = id,
                        timeout_ms = timeout.as_millis() as u64,
                        "Generation timed out"
                    );
                    Err(ThumbnailError::new(ThumbnailErrorKind::Timeout(timeout)).into())
                }
            };

            // Only our own ticket; a newer one may already occupy the key.
            tickets.remove_if(&key, |_, ticket| ticket.id == id);
            result
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(ThumbnailError::new(ThumbnailErrorKind::TaskFailed(e.to_string())).into())
            })
        }
        .boxed()
        .shared()
    }

    /// Whether a generation for `key` is in flight.
    pub fn is_pending(&self, key: &K) -> bool {
        self.tickets.contains_key(key)
    }

    /// Number of generations in flight.
    pub fn in_flight(&self) -> usize {
        self.tickets.len()
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
