//! Errors for the `sable-mpt` crate.

use alloy_primitives::B256;
use sable_kv::KvError;

/// A [Result] type alias where the error is [TrieError].
pub type TrieResult<T> = Result<T, TrieError>;

/// An error type for [Trie] operations.
///
/// [Trie]: crate::Trie
#[derive(Debug, derive_more::Display, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// The preimage of a referenced trie node is absent from the backing
    /// store.
    #[display("Missing trie node preimage: {_0}")]
    MissingNode(B256),
    /// Failed to decode a trie node.
    #[display("Failed to decode trie node: {_0}")]
    Rlp(alloy_rlp::Error),
    /// The backing store failed.
    #[display("Store error: {_0}")]
    Store(KvError),
}

impl core::error::Error for TrieError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<alloy_rlp::Error> for TrieError {
    fn from(err: alloy_rlp::Error) -> Self {
        Self::Rlp(err)
    }
}

impl From<KvError> for TrieError {
    fn from(err: KvError) -> Self {
        Self::Store(err)
    }
}
