//! Contains the [KeyValueStore] trait describing the byte-keyed stores the
//! state core is built on.

use crate::KvResult;
use alloc::rc::Rc;
use alloy_primitives::Bytes;
use core::cell::RefCell;

/// Describes the interface of a simple, synchronous key-value store.
///
/// Keys and values are arbitrary byte strings. No ordering or iteration
/// guarantees are made.
pub trait KeyValueStore: core::fmt::Debug {
    /// Get the value associated with the given key, or [None] if the key is
    /// absent.
    fn get(&self, key: &[u8]) -> KvResult<Option<Bytes>>;

    /// Set the value associated with the given key.
    fn set(&mut self, key: &[u8], value: Bytes) -> KvResult<()>;

    /// Delete the value associated with the given key.
    ///
    /// ## Returns
    /// - `Ok(())`: The key was present and has been removed.
    /// - `Err(KvError::NotFound)`: The key was absent.
    ///
    /// [KvError::NotFound]: crate::KvError::NotFound
    fn delete(&mut self, key: &[u8]) -> KvResult<()>;

    /// Returns whether the given key is present in the store.
    fn contains(&self, key: &[u8]) -> KvResult<bool>;
}

/// A shared handle to a [KeyValueStore].
///
/// The state core is single-threaded by contract, so shared access between
/// the trie layers and the journal owner uses [Rc] + [RefCell] rather than a
/// lock. A typed `Rc<RefCell<JournalStore<B>>>` coerces into this handle,
/// which is how the account and storage tries write through the journal the
/// facade controls.
pub type SharedStore = Rc<RefCell<dyn KeyValueStore>>;
