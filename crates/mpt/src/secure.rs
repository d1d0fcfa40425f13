//! This module contains [SecureTrie], a [Trie] adapter that hashes every key
//! with keccak-256 before delegating.

use crate::{Trie, TrieError};
use alloc::string::ToString;
use alloy_primitives::{keccak256, Bytes, B256};
use sable_kv::{KeyValueStore, KvError, KvResult, SharedStore};

/// A [Trie] whose keys are keccak-256 hashed before use, so that entry paths
/// are uniformly distributed regardless of the caller's key shapes. Account
/// tries (keyed by `keccak(address)`) and storage tries (keyed by
/// `keccak(pad32(slot))`) are both views of this type.
///
/// [SecureTrie] implements [KeyValueStore], which lets record caches and
/// other store decorators stack directly on top of it. Unlike a raw store,
/// its `delete` is structural trie removal and therefore idempotent: deleting
/// an absent key is a no-op rather than an error.
#[derive(Debug)]
pub struct SecureTrie {
    inner: Trie,
}

impl SecureTrie {
    /// Creates a new, empty [SecureTrie] over the given store.
    pub fn new(db: SharedStore) -> Self {
        Self { inner: Trie::new(db) }
    }

    /// Creates a [SecureTrie] view over the given store, rooted at an
    /// existing root hash.
    pub fn from_root(db: SharedStore, root: B256) -> Self {
        Self { inner: Trie::from_root(db, root) }
    }

    /// Returns the current root hash of the trie.
    pub const fn root(&self) -> B256 {
        self.inner.root()
    }

    /// Rebinds the view to an existing root in the backing store.
    pub fn set_root(&mut self, root: B256) {
        self.inner.set_root(root);
    }

    /// Returns a handle to the backing store.
    pub fn db(&self) -> SharedStore {
        self.inner.db()
    }
}

/// Maps a trie failure into the store error surface this adapter exposes.
fn into_kv(err: TrieError) -> KvError {
    match err {
        TrieError::Store(err) => err,
        other => KvError::Backend(other.to_string()),
    }
}

impl KeyValueStore for SecureTrie {
    fn get(&self, key: &[u8]) -> KvResult<Option<Bytes>> {
        self.inner.get(keccak256(key).as_slice()).map_err(into_kv)
    }

    fn set(&mut self, key: &[u8], value: Bytes) -> KvResult<()> {
        self.inner.insert(keccak256(key).as_slice(), value).map_err(into_kv)
    }

    fn delete(&mut self, key: &[u8]) -> KvResult<()> {
        self.inner.remove(keccak256(key).as_slice()).map(|_| ()).map_err(into_kv)
    }

    fn contains(&self, key: &[u8]) -> KvResult<bool> {
        self.inner.contains(keccak256(key).as_slice()).map_err(into_kv)
    }
}
