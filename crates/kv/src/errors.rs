//! Errors for the `sable-kv` crate.

use alloc::string::String;

/// A [Result] type alias where the error is [KvError].
pub type KvResult<T> = Result<T, KvError>;

/// An error type for [KeyValueStore] operations.
///
/// [KeyValueStore]: crate::KeyValueStore
#[derive(Debug, derive_more::Display, Clone, PartialEq, Eq)]
pub enum KvError {
    /// The key was required to be present, but is absent.
    #[display("Key not found in store")]
    NotFound,
    /// The backing store failed.
    #[display("Backend error: {_0}")]
    Backend(String),
}

impl core::error::Error for KvError {}
