//! Broker-facing error type.
//!
//! Wraps [`pubsub_core::error::CoreError`] with the one failure mode that
//! only makes sense at the broker layer: an invalid handle or argument.

use pubsub_core::error::CoreError;
use thiserror::Error;

/// Errors returned by broker and subscriber operations.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// A null/stale handle or otherwise invalid argument was passed.
    #[error("invalid argument")]
    InvalidArgument,

    /// The channel string is already subscribed on this subscriber.
    #[error("already subscribed")]
    AlreadySubscribed,

    /// The channel string is not currently subscribed on this subscriber.
    #[error("not subscribed")]
    NotSubscribed,

    /// `get_message` exceeded its deadline before a message arrived.
    #[error("timed out waiting for a message")]
    Timeout,

    /// An internal allocation or capacity guard was hit.
    #[error("out of memory")]
    OutOfMemory,
}

/// Result type alias for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;

impl From<CoreError> for BrokerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AlreadySubscribed => BrokerError::AlreadySubscribed,
            CoreError::NotSubscribed => BrokerError::NotSubscribed,
            CoreError::Timeout => BrokerError::Timeout,
            CoreError::OutOfMemory => BrokerError::OutOfMemory,
        }
    }
}
