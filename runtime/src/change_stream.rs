//! In-process multicast of newly created entities with replay-latest.
//!
//! The catalog and reviews services each own one [`ChangeStreamSink`]. A
//! successful create publishes the saved entity; every live subscriber
//! receives it, and a subscriber that joins later first receives the most
//! recently published entity, then everything published after it.
//!
//! # Architecture
//!
//! ```text
//!  POST handler ── publish(item) ──┐
//!                                  ▼
//!                       ┌────────────────────┐
//!                       │ Mutex<SinkState>   │
//!                       │  latest: Option<T> │
//!                       │  subscribers: map  │──try_send──► Subscription 1
//!                       │                    │──try_send──► Subscription 2
//!                       └────────────────────┘
//!                                  ▲
//!  GET /stream ──── subscribe() ───┘ (replays `latest` into the new channel)
//! ```
//!
//! Publishing and registration share one short critical section, so a new
//! subscriber sees the snapshot and then the tail with no gap or duplicate.
//! The lock is never held across an `.await`.
//!
//! # Saturation
//!
//! Each subscriber has a bounded buffer. A publish that finds a buffer full
//! drops the item for that subscriber only. With
//! [`EmitFailurePolicy::FailFast`] the publisher is told via
//! [`EmitError::Saturated`]; with [`EmitFailurePolicy::Drop`] it is only
//! logged. Either way the item stays in the `latest` slot.
//!
//! # Example
//!
//! ```rust
//! use futures::StreamExt;
//! use movies_runtime::change_stream::ChangeStreamSink;
//!
//! # async fn example() {
//! let sink = ChangeStreamSink::new("movie_info");
//! sink.publish(1).ok();
//!
//! let mut subscription = sink.subscribe();
//! sink.publish(2).ok();
//!
//! assert_eq!(subscription.next().await, Some(1)); // replayed latest
//! assert_eq!(subscription.next().await, Some(2));
//! # }
//! ```

use crate::metrics::ChangeStreamMetrics;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Default per-subscriber buffer size.
pub const DEFAULT_BUFFER: usize = 256;

/// How a publish reacts when a subscriber's buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitFailurePolicy {
    /// Drop the item for that subscriber and report success.
    Drop,
    /// Drop the item for that subscriber and report [`EmitError::Saturated`].
    #[default]
    FailFast,
}

/// A publish could not be fully delivered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// Some subscribers' buffers were full.
    #[error("change stream '{sink}' saturated: {dropped} of {subscribers} subscribers missed the item")]
    Saturated {
        /// Sink name.
        sink: &'static str,
        /// Subscribers that missed the item.
        dropped: usize,
        /// Subscribers registered at publish time.
        subscribers: usize,
    },

    /// The sink was completed; nothing is delivered any more.
    #[error("change stream '{sink}' is completed")]
    Completed {
        /// Sink name.
        sink: &'static str,
    },
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    /// Subscribers that accepted the item.
    pub delivered: usize,
    /// Subscribers that missed it because their buffer was full.
    pub dropped: usize,
}

/// Lifecycle of a [`Subscription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Registered, not yet polled.
    Idle,
    /// Polled at least once and still registered.
    Active,
    /// Dropped by the subscriber.
    Cancelled,
    /// The sink completed and every buffered item was consumed.
    Completed,
}

struct SinkState<T> {
    latest: Option<T>,
    subscribers: HashMap<u64, mpsc::Sender<T>>,
    next_id: u64,
    completed: bool,
}

struct Shared<T> {
    name: &'static str,
    buffer: usize,
    policy: EmitFailurePolicy,
    state: Mutex<SinkState<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, SinkState<T>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Replay-latest multicast sink.
///
/// Cheap to clone; clones share the same subscribers and `latest` slot.
pub struct ChangeStreamSink<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ChangeStreamSink<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for ChangeStreamSink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("ChangeStreamSink")
            .field("name", &self.shared.name)
            .field("buffer", &self.shared.buffer)
            .field("policy", &self.shared.policy)
            .field("subscribers", &state.subscribers.len())
            .field("completed", &state.completed)
            .finish_non_exhaustive()
    }
}

impl<T> ChangeStreamSink<T>
where
    T: Clone + Send + 'static,
{
    /// Create a sink with the default buffer and [`EmitFailurePolicy::FailFast`].
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self::with_options(name, DEFAULT_BUFFER, EmitFailurePolicy::default())
    }

    /// Create a sink with an explicit per-subscriber buffer and emit policy.
    ///
    /// A `buffer` of zero is raised to one so the replayed item always fits.
    #[must_use]
    pub fn with_options(name: &'static str, buffer: usize, policy: EmitFailurePolicy) -> Self {
        Self {
            shared: Arc::new(Shared {
                name,
                buffer: buffer.max(1),
                policy,
                state: Mutex::new(SinkState {
                    latest: None,
                    subscribers: HashMap::new(),
                    next_id: 0,
                    completed: false,
                }),
            }),
        }
    }

    /// Deliver `item` to every live subscriber and make it the replayed item.
    ///
    /// Never blocks and never waits on a subscriber.
    ///
    /// # Errors
    ///
    /// - [`EmitError::Completed`] after [`complete`](Self::complete).
    /// - [`EmitError::Saturated`] under [`EmitFailurePolicy::FailFast`] when
    ///   at least one subscriber missed the item.
    pub fn publish(&self, item: T) -> Result<PublishReport, EmitError> {
        let sink = self.shared.name;
        let mut state = self.shared.lock();

        if state.completed {
            return Err(EmitError::Completed { sink });
        }

        let mut report = PublishReport::default();
        let mut closed = Vec::new();

        for (id, sender) in &state.subscribers {
            match sender.try_send(item.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => report.dropped += 1,
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }
        for id in closed {
            state.subscribers.remove(&id);
        }

        state.latest = Some(item);
        let subscribers = state.subscribers.len();
        drop(state);

        ChangeStreamMetrics::record_publish(sink, report.delivered);
        ChangeStreamMetrics::record_subscribers(sink, subscribers);

        if report.dropped == 0 {
            return Ok(report);
        }

        tracing::warn!(
            sink,
            dropped = report.dropped,
            subscribers,
            "Change stream subscriber buffer full, item dropped"
        );
        ChangeStreamMetrics::record_dropped(sink, report.dropped);

        match self.shared.policy {
            EmitFailurePolicy::Drop => Ok(report),
            EmitFailurePolicy::FailFast => Err(EmitError::Saturated {
                sink,
                dropped: report.dropped,
                subscribers,
            }),
        }
    }

    /// Register a new subscriber.
    ///
    /// The subscription yields the most recently published item first (if
    /// any), then every item published while it stays alive.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = mpsc::channel(self.shared.buffer);
        let mut state = self.shared.lock();

        if let Some(latest) = &state.latest {
            // The channel is fresh and has capacity >= 1.
            let _ = sender.try_send(latest.clone());
        }

        let id = state.next_id;
        state.next_id += 1;

        if !state.completed {
            state.subscribers.insert(id, sender);
        }
        let subscribers = state.subscribers.len();
        drop(state);

        ChangeStreamMetrics::record_subscribers(self.shared.name, subscribers);
        tracing::debug!(
            sink = self.shared.name,
            id,
            subscribers,
            "Change stream subscriber registered"
        );

        Subscription {
            id,
            receiver,
            sink: Arc::downgrade(&self.shared),
            state: SubscriptionState::Idle,
        }
    }

    /// End every subscription and refuse further publishes.
    ///
    /// Subscribers still receive items already buffered for them.
    pub fn complete(&self) {
        let mut state = self.shared.lock();
        state.completed = true;
        state.subscribers.clear();
        drop(state);

        ChangeStreamMetrics::record_subscribers(self.shared.name, 0);
        tracing::info!(sink = self.shared.name, "Change stream completed");
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }

    /// The item a new subscriber would receive first.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.shared.lock().latest.clone()
    }

    /// Sink name, used in logs and metrics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.shared.name
    }
}

/// A live registration on a [`ChangeStreamSink`].
///
/// Dropping it removes the registration immediately.
pub struct Subscription<T> {
    id: u64,
    receiver: mpsc::Receiver<T>,
    sink: Weak<Shared<T>>,
    state: SubscriptionState,
}

impl<T> Subscription<T> {
    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SubscriptionState {
        self.state
    }

    fn unregister(&self) {
        if let Some(shared) = self.sink.upgrade() {
            let mut state = shared.lock();
            state.subscribers.remove(&self.id);
            let subscribers = state.subscribers.len();
            drop(state);

            ChangeStreamMetrics::record_subscribers(shared.name, subscribers);
            tracing::debug!(sink = shared.name, id = self.id, "Change stream subscriber cancelled");
        }
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if self.state == SubscriptionState::Idle {
            self.state = SubscriptionState::Active;
        }

        let polled = self.receiver.poll_recv(cx);
        if let Poll::Ready(None) = polled {
            self.state = SubscriptionState::Completed;
        }
        polled
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if matches!(self.state, SubscriptionState::Idle | SubscriptionState::Active) {
            self.state = SubscriptionState::Cancelled;
            self.unregister();
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
