//! Error types for the cart persistence boundary.
//!
//! Nothing in the cart subsystem is fatal: storage errors are either turned
//! into a `LoadCartFailure` action (hydration) or logged and dropped (writes).

use thiserror::Error;

/// Errors raised by a [`KeyValueStorage`](crate::persistence::KeyValueStorage)
/// backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The write would exceed the backend's size limit.
    #[error("storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded {
        /// Bytes the stored values would occupy after the write.
        needed: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The key cannot be mapped onto the backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The backend cannot be reached at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The cart snapshot could not be encoded.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
