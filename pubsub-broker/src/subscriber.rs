//! A subscriber: a prefix set plus the queue messages land on.

use std::sync::{Arc, Weak};
use std::time::Duration;

use pubsub_core::queue::WaitableQueue;

use crate::broker::{BrokerInner, SubscriberId};
use crate::error::{BrokerError, Result};
use crate::message::Message;

/// A handle to one broker-owned subscriber.
///
/// Holds its message queue directly (so draining never needs the broker
/// lock) and a non-owning [`Weak`] back-reference to the broker, used only
/// to reach the mutex guarding subscription membership. The broker, not the
/// subscriber, owns the subscriber's trie and lifetime.
pub struct Subscriber {
    pub(crate) id: SubscriberId,
    pub(crate) queue: Arc<WaitableQueue<Message>>,
    pub(crate) broker: Weak<BrokerInner>,
}

impl Subscriber {
    /// This subscriber's stable identifier within its broker.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Subscribe to `channel`, matching it and every longer channel it's a
    /// prefix of.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::AlreadySubscribed`] if `channel` is already
    /// subscribed, or [`BrokerError::InvalidArgument`] if the owning broker
    /// has already been torn down.
    pub fn subscribe(&self, channel: &[u8]) -> Result<()> {
        let broker = self.broker.upgrade().ok_or(BrokerError::InvalidArgument)?;
        broker.subscribe(self.id, channel)
    }

    /// Remove one subscription to `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::NotSubscribed`] if `channel` was not
    /// subscribed, or [`BrokerError::InvalidArgument`] if the owning broker
    /// has already been torn down.
    pub fn unsubscribe(&self, channel: &[u8]) -> Result<()> {
        let broker = self.broker.upgrade().ok_or(BrokerError::InvalidArgument)?;
        broker.unsubscribe(self.id, channel)
    }

    /// Block for up to `timeout_ms` milliseconds for the next message.
    ///
    /// `timeout_ms <= 0` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Timeout`] if no message arrives in time.
    pub fn get_message(&self, timeout_ms: i64) -> Result<Message> {
        let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms as u64));
        let delivery = self.queue.get(timeout)?;
        Ok(delivery.elem)
    }

    /// Number of messages currently queued for this subscriber.
    #[must_use]
    pub fn messages_count(&self) -> usize {
        self.queue.length()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        if let Some(broker) = self.broker.upgrade() {
            broker.delete_subscriber(self.id);
        }
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}
