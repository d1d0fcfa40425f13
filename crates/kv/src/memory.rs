//! Contains a concrete implementation of the [KeyValueStore] trait that
//! stores data in memory.

use crate::{KeyValueStore, KvError, KvResult};
use alloc::vec::Vec;
use alloy_primitives::{map::HashMap, Bytes};

/// A simple, synchronous key-value store that keeps data in memory. This is
/// the reference backend used in tests and the default backing for
/// freshly-constructed states.
#[derive(Default, Clone, Debug, Eq, PartialEq)]
pub struct MemoryStore {
    store: HashMap<Vec<u8>, Bytes>,
}

impl MemoryStore {
    /// Create a new [MemoryStore] with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries in the store.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> KvResult<Option<Bytes>> {
        Ok(self.store.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: Bytes) -> KvResult<()> {
        self.store.insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> KvResult<()> {
        self.store.remove(key).map(|_| ()).ok_or(KvError::NotFound)
    }

    fn contains(&self, key: &[u8]) -> KvResult<bool> {
        Ok(self.store.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::bytes;

    #[test]
    fn test_set_get_roundtrip() {
        let mut store = MemoryStore::new();
        store.set(b"key", bytes!("beef")).unwrap();
        assert_eq!(store.get(b"key").unwrap(), Some(bytes!("beef")));
        assert_eq!(store.get(b"other").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = MemoryStore::new();
        store.set(b"key", bytes!("01")).unwrap();
        store.set(b"key", bytes!("02")).unwrap();
        assert_eq!(store.get(b"key").unwrap(), Some(bytes!("02")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_present() {
        let mut store = MemoryStore::new();
        store.set(b"key", bytes!("beef")).unwrap();
        store.delete(b"key").unwrap();
        assert_eq!(store.get(b"key").unwrap(), None);
        assert!(!store.contains(b"key").unwrap());
    }

    #[test]
    fn test_delete_absent_is_not_found() {
        let mut store = MemoryStore::new();
        assert_eq!(store.delete(b"key"), Err(KvError::NotFound));
    }
}
