//! This module contains [CachedRlpStore], an LRU of decoded records layered
//! over a store of their RLP encodings.

use crate::{CacheError, CacheResult};
use alloc::vec::Vec;
use alloy_rlp::{Decodable, Encodable};
use core::{fmt, num::NonZeroUsize};
use lru::LruCache;
use sable_kv::KeyValueStore;

/// The default number of decoded records kept by a [CachedRlpStore].
pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(2048) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Reads and writes decoded records of a single type `T`, where the wrapped
/// store holds their RLP encodings.
///
/// Reads are served from an LRU of decoded values when possible and decode
/// through on a miss; writes go through to the wrapped store immediately. An
/// absent key (or an empty stored encoding) yields the configured default
/// record, or [CacheError::NotFound] when none is configured. Deletion
/// invalidates exactly the deleted entry; the rest of the cache is left hot.
pub struct CachedRlpStore<S, T> {
    /// The wrapped store of RLP encodings.
    db: S,
    /// Decoded records, most recently used first.
    cache: LruCache<Vec<u8>, T>,
    /// The record returned for absent keys, if any.
    default: Option<T>,
}

impl<S, T> CachedRlpStore<S, T>
where
    S: KeyValueStore,
    T: Encodable + Decodable + Clone,
{
    /// Creates a new [CachedRlpStore] over the given store with the
    /// [DEFAULT_CACHE_CAPACITY].
    pub fn new(db: S, default: Option<T>) -> Self {
        Self::with_capacity(db, default, DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a new [CachedRlpStore] with an explicit cache capacity.
    pub fn with_capacity(db: S, default: Option<T>, capacity: NonZeroUsize) -> Self {
        Self { db, cache: LruCache::new(capacity), default }
    }

    /// Returns a reference to the wrapped store.
    pub const fn inner(&self) -> &S {
        &self.db
    }

    /// Returns a mutable reference to the wrapped store.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.db
    }

    /// Fetches the record stored under the given key.
    pub fn get(&mut self, key: &[u8]) -> CacheResult<T> {
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit.clone());
        }
        match self.db.get(key)? {
            Some(encoded) if !encoded.is_empty() => {
                let decoded = T::decode(&mut encoded.as_ref())?;
                self.cache.put(key.to_vec(), decoded.clone());
                Ok(decoded)
            }
            // An absent key and an empty encoding both mean "no record".
            _ => self.default.clone().ok_or(CacheError::NotFound),
        }
    }

    /// Stores a record under the given key, writing its encoding through to
    /// the wrapped store.
    pub fn set(&mut self, key: &[u8], value: T) -> CacheResult<()> {
        let encoded = alloy_rlp::encode(&value);
        self.cache.put(key.to_vec(), value);
        self.db.set(key, encoded.into())?;
        Ok(())
    }

    /// Deletes the record stored under the given key, invalidating its cache
    /// entry.
    pub fn delete(&mut self, key: &[u8]) -> CacheResult<()> {
        self.db.delete(key)?;
        self.cache.pop(key);
        Ok(())
    }
}

impl<S: fmt::Debug, T> fmt::Debug for CachedRlpStore<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedRlpStore")
            .field("db", &self.db)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sable_kv::{KvError, MemoryStore};
    use std::collections::HashMap;

    fn new_cached(default: Option<u64>) -> CachedRlpStore<MemoryStore, u64> {
        CachedRlpStore::new(MemoryStore::new(), default)
    }

    #[test]
    fn test_get_absent_with_default() {
        let mut store = new_cached(Some(7));
        assert_eq!(store.get(b"missing").unwrap(), 7);
    }

    #[test]
    fn test_get_absent_without_default() {
        let mut store = new_cached(None);
        assert_eq!(store.get(b"missing"), Err(CacheError::NotFound));
    }

    #[test]
    fn test_set_writes_through() {
        let mut store = new_cached(None);
        store.set(b"key", 42).unwrap();
        assert_eq!(store.get(b"key").unwrap(), 42);
        assert_eq!(
            store.inner().get(b"key").unwrap(),
            Some(alloy_rlp::encode(42u64).into())
        );
    }

    #[test]
    fn test_empty_encoding_means_absent() {
        let mut store = new_cached(Some(7));
        store.inner_mut().set(b"key", alloy_primitives::Bytes::new()).unwrap();
        assert_eq!(store.get(b"key").unwrap(), 7);
    }

    #[test]
    fn test_delete_invalidates_single_entry() {
        let mut store = new_cached(Some(0));
        store.set(b"a", 1).unwrap();
        store.set(b"b", 2).unwrap();
        store.delete(b"a").unwrap();

        // The deleted key falls back to the default; its neighbor stays hot.
        assert_eq!(store.get(b"a").unwrap(), 0);
        assert_eq!(store.get(b"b").unwrap(), 2);
    }

    #[test]
    fn test_delete_absent_is_not_found() {
        let mut store = new_cached(Some(0));
        assert_eq!(store.delete(b"missing"), Err(CacheError::Store(KvError::NotFound)));
    }

    #[test]
    fn test_eviction_falls_back_to_store() {
        let mut store = CachedRlpStore::with_capacity(
            MemoryStore::new(),
            None,
            NonZeroUsize::new(2).unwrap(),
        );
        store.set(b"a", 1u64).unwrap();
        store.set(b"b", 2).unwrap();
        store.set(b"c", 3).unwrap();

        // `a` was evicted by `c`; the read decodes through from the store.
        assert_eq!(store.get(b"a").unwrap(), 1);
        assert_eq!(store.get(b"b").unwrap(), 2);
        assert_eq!(store.get(b"c").unwrap(), 3);
    }

    proptest! {
        /// Under any access sequence and a tiny capacity forcing evictions,
        /// the cached store reads exactly what an uncached map would.
        #[test]
        fn test_matches_uncached_reference(
            ops in proptest::collection::vec((0u8..8, any::<u64>(), 0u8..3), 1..256)
        ) {
            let mut cached = CachedRlpStore::with_capacity(
                MemoryStore::new(),
                Some(0u64),
                NonZeroUsize::new(3).unwrap(),
            );
            let mut reference: HashMap<u8, u64> = HashMap::new();

            for (key, value, kind) in ops {
                match kind {
                    0 => {
                        cached.set(&[key], value).unwrap();
                        reference.insert(key, value);
                    }
                    1 => {
                        let expected = reference.get(&key).copied().unwrap_or_default();
                        prop_assert_eq!(cached.get(&[key]).unwrap(), expected);
                    }
                    _ => {
                        let removed = reference.remove(&key).is_some();
                        let result = cached.delete(&[key]);
                        prop_assert_eq!(result.is_ok(), removed);
                        prop_assert_eq!(cached.get(&[key]).unwrap(), 0);
                    }
                }
            }
        }
    }
}
