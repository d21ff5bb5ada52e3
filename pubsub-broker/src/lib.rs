//! # pubsub-broker
//!
//! An in-process publish/subscribe message broker for multi-threaded
//! applications.
//!
//! ## Architecture
//!
//! Structured as a small **messaging kernel** with clean layering:
//!
//! - **`pubsub-core`**: reference-counted prefix trie, blocking waitable queue
//! - **`pubsub-broker`**: public API surface (this crate) — `Broker`,
//!   `Subscriber`, `Message`
//!
//! ## Quick Start
//!
//! ```rust
//! use pubsub_broker::Broker;
//!
//! let broker = Broker::new();
//! let sub = broker.new_subscriber().unwrap();
//! sub.subscribe(b"orders").unwrap();
//!
//! let delivered = broker.publish("orders/created", "payload").unwrap();
//! assert_eq!(delivered, 1);
//!
//! let msg = sub.get_message(0).unwrap();
//! assert_eq!(msg.channel(), "orders/created");
//! ```
//!
//! ## Performance
//!
//! - **Zero-copy payloads**: uses `bytes::Bytes` for refcounted message bodies
//! - **Single-mutex broker**: one `parking_lot::Mutex` guards subscriber
//!   membership and every subscriber's trie; one `Mutex` + `Condvar` pair per
//!   subscriber queue
//! - **Sparse/dense tries**: per-subscriber subscription sets adapt their
//!   child-array representation to fan-out automatically
//!
//! ## Safety
//!
//! - `pubsub-core` is `#![deny(unsafe_code)]`
//! - This crate contains no `unsafe` code

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]

mod broker;
mod error;
mod message;
mod subscriber;

pub use broker::{default_broker, Broker, SubscriberId};
pub use bytes::Bytes;
pub use error::{BrokerError, Result};
pub use message::Message;
pub use subscriber::Subscriber;

/// Development helpers (benches/tests)
pub mod dev_tracing;

/// Convenience re-exports for downstream crates.
pub mod prelude {
    pub use crate::{default_broker, Broker, BrokerError, Message, Result, Subscriber};
}
