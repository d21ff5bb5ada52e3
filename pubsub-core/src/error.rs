//! Error types shared by the trie and queue kernels.

use thiserror::Error;

/// Errors surfaced by the low-level pub/sub kernel (trie + waitable queue).
#[derive(Error, Debug)]
pub enum CoreError {
    /// The requested prefix is already present with a positive refcount.
    #[error("prefix already subscribed")]
    AlreadySubscribed,

    /// The requested prefix was not found (or has a zero refcount).
    #[error("prefix not subscribed")]
    NotSubscribed,

    /// A blocking wait exceeded its deadline before an element arrived.
    #[error("timed out waiting for an element")]
    Timeout,

    /// The internal capacity guard was hit while allocating a new node or link record.
    #[error("out of memory: capacity guard exceeded")]
    OutOfMemory,
}

/// Result type alias for kernel operations.
pub type Result<T> = std::result::Result<T, CoreError>;
