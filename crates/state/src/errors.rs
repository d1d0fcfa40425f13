//! Errors for the `sable-state` crate.

use sable_kv::KvError;

/// A [Result] type alias where the error is [CacheError].
pub type CacheResult<T> = Result<T, CacheError>;

/// An error type for [CachedRlpStore] operations.
///
/// [CachedRlpStore]: crate::CachedRlpStore
#[derive(Debug, derive_more::Display, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The key is absent and no default record is configured.
    #[display("Record not found and no default is configured")]
    NotFound,
    /// Failed to decode a stored record.
    #[display("Failed to decode record: {_0}")]
    Rlp(alloy_rlp::Error),
    /// The wrapped store failed.
    #[display("Store error: {_0}")]
    Store(KvError),
}

impl core::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<KvError> for CacheError {
    fn from(err: KvError) -> Self {
        Self::Store(err)
    }
}

impl From<alloy_rlp::Error> for CacheError {
    fn from(err: alloy_rlp::Error) -> Self {
        Self::Rlp(err)
    }
}

/// A [Result] type alias where the error is [StateError].
pub type StateResult<T> = Result<T, StateError>;

/// An error type for world-state operations.
#[derive(Debug, derive_more::Display, Clone, PartialEq, Eq)]
pub enum StateError {
    /// An account record could not be read or written.
    #[display("Account record error: {_0}")]
    Cache(CacheError),
    /// The backing store failed.
    #[display("Store error: {_0}")]
    Store(KvError),
    /// A stored value could not be decoded.
    #[display("Failed to decode stored value: {_0}")]
    Rlp(alloy_rlp::Error),
    /// Arithmetic on an account value overflowed its 256-bit range.
    #[display("Arithmetic overflow adjusting an account value")]
    Overflow,
}

impl core::error::Error for StateError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Cache(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CacheError> for StateError {
    fn from(err: CacheError) -> Self {
        Self::Cache(err)
    }
}

impl From<KvError> for StateError {
    fn from(err: KvError) -> Self {
        Self::Store(err)
    }
}

impl From<alloy_rlp::Error> for StateError {
    fn from(err: alloy_rlp::Error) -> Self {
        Self::Rlp(err)
    }
}
