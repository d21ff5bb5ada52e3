//! Pub/sub kernel
//!
//! Runtime-agnostic building blocks shared by every broker:
//! - Reference-counted prefix matching (`trie`)
//! - Blocking, timeout-aware FIFO queue (`queue`)
//! - Error types (`error`)

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod queue;
pub mod trie;

/// Convenience re-exports for downstream crates.
pub mod prelude {
    pub use crate::error::{CoreError, Result};
    pub use crate::queue::{Delivery, WaitableQueue};
    pub use crate::trie::{AddResult, RemoveResult, Trie};
}
