//! Keeps one derived view in step with its selected input key.
//!
//! Each `Recompute` owns a single published `ViewSnapshot`. Every computation started
//! for a key is stamped with a generation; its result is published only if no newer
//! selection or refresh has started since. Older results are dropped when they resolve.
//! The underlying fetches are not cancelled.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use course_core::Clock;

use crate::error::AggregationError;

/// Lifecycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Fetching,
    Ready,
    Failed,
}

/// What consumers render: the current selection plus the last good view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot<K, T> {
    pub phase: Phase,
    /// Currently selected input.
    pub key: Option<K>,
    pub generation: u64,
    /// Last successfully computed view. Kept through failures.
    pub view: Option<T>,
    /// Key `view` was computed for; differs from `key` while fetching or after a failure.
    pub view_key: Option<K>,
    /// Set only while `Failed`; cleared when the next computation starts.
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<K, T> Default for ViewSnapshot<K, T> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            key: None,
            generation: 0,
            view: None,
            view_key: None,
            error: None,
            updated_at: None,
        }
    }
}

impl<K: PartialEq, T> ViewSnapshot<K, T> {
    /// True when the visible view does not reflect a successful computation for the
    /// current key.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.phase != Phase::Ready || self.view_key != self.key
    }
}

/// Proof that a computation was started; hand it back to `finish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    generation: u64,
    key: K,
}

impl<K> Ticket<K> {
    /// Input the computation was started for.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }
}

/// Result of one `select`/`refresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeOutcome {
    /// Key unchanged and already fetching or ready; nothing started.
    Skipped,
    /// Result was published.
    Published,
    /// A newer computation started meanwhile; result dropped.
    Discarded,
}

pub struct Recompute<K, T> {
    clock: Clock,
    state: watch::Sender<ViewSnapshot<K, T>>,
}

impl<K, T> Recompute<K, T>
where
    K: Clone + PartialEq + fmt::Debug,
    T: Clone,
{
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        let (state, _) = watch::channel(ViewSnapshot::default());
        Self { clock, state }
    }

    /// Receive every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot<K, T>> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot<K, T> {
        self.state.borrow().clone()
    }

    /// Move to `Fetching` for `key`.
    ///
    /// Returns `None` when `key` is already selected and fetching or ready, unless
    /// `force` is set. Any computation still in flight is superseded.
    pub fn begin(&self, key: K, force: bool) -> Option<Ticket<K>> {
        let mut ticket = None;
        self.state.send_if_modified(|snap| {
            let unchanged = snap.key.as_ref() == Some(&key);
            if unchanged && !force && matches!(snap.phase, Phase::Fetching | Phase::Ready) {
                return false;
            }
            snap.generation += 1;
            snap.phase = Phase::Fetching;
            snap.key = Some(key.clone());
            snap.error = None;
            debug!(?key, generation = snap.generation, "recompute started");
            ticket = Some(Ticket {
                generation: snap.generation,
                key,
            });
            true
        });
        ticket
    }

    /// Publish the outcome of a computation if it is still the latest one.
    pub fn finish(
        &self,
        ticket: Ticket<K>,
        result: Result<T, AggregationError>,
    ) -> RecomputeOutcome {
        let now = self.clock.now();
        let published = self.state.send_if_modified(|snap| {
            if snap.generation != ticket.generation {
                debug!(
                    key = ?ticket.key,
                    generation = ticket.generation,
                    current = snap.generation,
                    "discarding superseded result"
                );
                return false;
            }
            match result {
                Ok(view) => {
                    snap.phase = Phase::Ready;
                    snap.view = Some(view);
                    snap.view_key = Some(ticket.key);
                    snap.error = None;
                }
                Err(err) => {
                    debug!(key = ?ticket.key, error = %err, "recompute failed, keeping last view");
                    snap.phase = Phase::Failed;
                    snap.error = Some(err.to_string());
                }
            }
            snap.updated_at = Some(now);
            true
        });
        if published {
            RecomputeOutcome::Published
        } else {
            RecomputeOutcome::Discarded
        }
    }

    /// Select `key` and recompute its view unless it is already current.
    pub async fn select<F, Fut>(&self, key: K, compute: F) -> RecomputeOutcome
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T, AggregationError>>,
    {
        let Some(ticket) = self.begin(key, false) else {
            return RecomputeOutcome::Skipped;
        };
        let result = compute(ticket.key().clone()).await;
        self.finish(ticket, result)
    }

    /// Recompute the view for the current key, superseding anything in flight.
    ///
    /// Skipped when nothing is selected.
    pub async fn refresh<F, Fut>(&self, compute: F) -> RecomputeOutcome
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T, AggregationError>>,
    {
        let current = self.state.borrow().key.clone();
        let Some(key) = current else {
            return RecomputeOutcome::Skipped;
        };
        let Some(ticket) = self.begin(key, true) else {
            return RecomputeOutcome::Skipped;
        };
        let result = compute(ticket.key().clone()).await;
        self.finish(ticket, result)
    }

    /// Drop the selection and the published view; in-flight results are discarded.
    pub fn clear(&self) {
        self.state.send_modify(|snap| {
            let generation = snap.generation + 1;
            *snap = ViewSnapshot {
                generation,
                ..ViewSnapshot::default()
            };
        });
    }
}
