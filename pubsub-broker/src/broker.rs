//! The broker: a subscriber set behind a single lock, plus publish fan-out.

use std::sync::Arc;

use bytes::Bytes;
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use pubsub_core::queue::WaitableQueue;
use pubsub_core::trie::{RemoveResult, Trie};

use crate::error::{BrokerError, Result};
use crate::message::Message;
use crate::subscriber::Subscriber;

/// Stable identifier for a subscriber within its broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

struct SubscriberRecord {
    trie: Trie,
    queue: Arc<WaitableQueue<Message>>,
}

struct BrokerState {
    subscribers: HashMap<SubscriberId, SubscriberRecord>,
    next_id: u64,
}

/// Shared broker state. Lives behind an [`Arc`] so subscribers can hold a
/// [`std::sync::Weak`] back-reference without keeping the broker alive or
/// forming an ownership cycle (the broker owns its subscribers' records
/// directly; a subscriber only needs to find the lock again).
pub(crate) struct BrokerInner {
    state: Mutex<BrokerState>,
}

impl BrokerInner {
    pub(crate) fn subscribe(&self, id: SubscriberId, channel: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        let record = state
            .subscribers
            .get_mut(&id)
            .ok_or(BrokerError::InvalidArgument)?;
        if record.trie.contains_exact(channel) {
            return Err(BrokerError::AlreadySubscribed);
        }
        record.trie.insert(channel);
        tracing::debug!(subscriber = id.0, channel = %String::from_utf8_lossy(channel), "subscribed");
        Ok(())
    }

    pub(crate) fn unsubscribe(&self, id: SubscriberId, channel: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        let record = state
            .subscribers
            .get_mut(&id)
            .ok_or(BrokerError::InvalidArgument)?;
        match record.trie.remove(channel) {
            // The broker's `subscribe` never lets a refcount exceed 1, so
            // `Decremented` shouldn't arise through this API in practice;
            // treat it the same as `Removed` rather than special-case an
            // unreachable branch (see the subscribe/unsubscribe state-machine
            // note in the design doc).
            RemoveResult::Removed | RemoveResult::Decremented => {
                tracing::debug!(subscriber = id.0, channel = %String::from_utf8_lossy(channel), "unsubscribed");
                Ok(())
            }
            RemoveResult::NotFound => Err(BrokerError::NotSubscribed),
        }
    }

    pub(crate) fn delete_subscriber(&self, id: SubscriberId) {
        let mut state = self.state.lock();
        if state.subscribers.remove(&id).is_some() {
            tracing::debug!(subscriber = id.0, "subscriber detached");
        }
    }
}

/// An in-process publish/subscribe broker.
///
/// Cloning a `Broker` shares the same underlying subscriber set (it is a
/// cheap `Arc` handle), the way a single mutex is meant to be shared across
/// every publisher and subscriber thread that uses it.
#[derive(Clone)]
pub struct Broker {
    inner: Arc<BrokerInner>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    /// Construct a new, empty broker.
    #[must_use]
    pub fn new() -> Self {
        Broker {
            inner: Arc::new(BrokerInner {
                state: Mutex::new(BrokerState {
                    subscribers: HashMap::new(),
                    next_id: 0,
                }),
            }),
        }
    }

    /// Create and attach a new subscriber.
    ///
    /// # Errors
    ///
    /// This currently cannot fail; it returns [`Result`] for API symmetry
    /// with the other broker operations and to leave room for a future
    /// capacity guard without a breaking signature change.
    pub fn new_subscriber(&self) -> Result<Subscriber> {
        let mut state = self.inner.state.lock();
        let id = SubscriberId(state.next_id);
        state.next_id += 1;
        let queue = Arc::new(WaitableQueue::new());
        state.subscribers.insert(
            id,
            SubscriberRecord {
                trie: Trie::new(),
                queue: queue.clone(),
            },
        );
        drop(state);
        tracing::debug!(subscriber = id.0, "subscriber attached");
        Ok(Subscriber {
            id,
            queue,
            broker: Arc::downgrade(&self.inner),
        })
    }

    /// Deliver `payload` to every subscriber whose subscription set contains
    /// a prefix of `channel`. Returns the number of subscribers delivered to.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::OutOfMemory`] if enqueueing a delivery fails
    /// partway through the fan-out; subscribers already delivered to keep
    /// their messages.
    pub fn publish(&self, channel: &str, payload: impl Into<Bytes>) -> Result<usize> {
        let payload = payload.into();
        let mut state = self.inner.state.lock();
        let mut delivered = 0usize;
        for record in state.subscribers.values_mut() {
            if record.trie.matches(channel.as_bytes()) {
                if let Err(err) = record.queue.put(Message::new(channel, payload.clone()), 0) {
                    tracing::warn!(channel, delivered, %err, "publish fan-out aborted early");
                    return Err(err.into());
                }
                delivered += 1;
            }
        }
        tracing::trace!(channel, delivered, "publish fan-out complete");
        Ok(delivered)
    }

    /// Number of subscribers currently attached to this broker.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }

    /// Assert that every subscriber created from this broker has already
    /// been dropped. Purely a diagnostic aid for callers that want to catch
    /// a subscriber leak before the broker itself goes out of scope.
    pub fn shutdown(&self) {
        let state = self.inner.state.lock();
        debug_assert!(
            state.subscribers.is_empty(),
            "broker shut down with {} subscriber(s) still attached",
            state.subscribers.len()
        );
    }
}

static DEFAULT_BROKER: Lazy<Broker> = Lazy::new(Broker::new);

/// The process-wide default broker, lazily initialised on first use and
/// never torn down by this crate.
#[must_use]
pub fn default_broker() -> &'static Broker {
    &DEFAULT_BROKER
}
