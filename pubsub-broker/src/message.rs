//! The unit of delivery between a publisher and a matched subscriber.

use bytes::Bytes;

/// An independent copy of a published channel name and payload, owned by the
/// subscriber that received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    channel: String,
    payload: Bytes,
}

impl Message {
    /// Construct a message from an owned channel and payload.
    #[must_use]
    pub fn new(channel: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Message {
            channel: channel.into(),
            payload: payload.into(),
        }
    }

    /// The channel this message was published to.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The message body.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True iff the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Release this message's resources.
    ///
    /// Rust's ownership model already frees `channel` and `payload` on
    /// `Drop`; this exists only so the crate's external surface mirrors the
    /// explicit `free_message` call a caller would otherwise need to make.
    pub fn free(self) {}
}
