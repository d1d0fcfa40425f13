//! Contains [JournalStore], a changeset journal over any [KeyValueStore].

use crate::{KeyValueStore, KvError, KvResult};
use alloc::vec::Vec;
use alloy_primitives::{map::HashMap, Bytes};

/// An opaque identifier for a changeset opened with [JournalStore::record].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checkpoint(u64);

/// A single pending write within a changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
enum JournalEntry {
    /// The key maps to the given value.
    Value(Bytes),
    /// The key is deleted; deeper layers are shadowed.
    Deleted,
}

/// A pending layer of writes and tombstones, identified by a [Checkpoint].
#[derive(Debug, Clone)]
struct Changeset {
    id: Checkpoint,
    entries: HashMap<Vec<u8>, JournalEntry>,
}

/// A [KeyValueStore] layering a stack of pending changesets over a wrapped
/// store.
///
/// Writes land in the topmost changeset; reads consult changesets top-down
/// and fall through to the wrapped store. A changeset opened with
/// [Self::record] can be erased with [Self::discard] or folded into its
/// parent with [Self::commit]; nothing reaches the wrapped store until
/// [Self::persist].
///
/// Writes issued while no changeset is open land in a base overlay that only
/// [Self::persist] flushes, so the journal's view is always the source of
/// truth until an explicit flush.
#[derive(Debug, Clone)]
pub struct JournalStore<B> {
    /// The wrapped store. Nothing is written to it outside of
    /// [Self::persist].
    db: B,
    /// Committed-but-unpersisted writes.
    base: HashMap<Vec<u8>, JournalEntry>,
    /// The stack of open changesets, oldest first.
    stack: Vec<Changeset>,
    /// The id handed to the next [Self::record] call.
    next_id: u64,
}

impl<B> JournalStore<B>
where
    B: KeyValueStore,
{
    /// Create a new [JournalStore] wrapping the given store.
    pub fn new(db: B) -> Self {
        Self { db, base: HashMap::default(), stack: Vec::new(), next_id: 0 }
    }

    /// Returns a reference to the wrapped store.
    pub const fn inner(&self) -> &B {
        &self.db
    }

    /// Returns a mutable reference to the wrapped store.
    ///
    /// Writing through this reference bypasses the journal; it exists for
    /// inspection and test setup.
    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.db
    }

    /// Returns the number of open changesets.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Open a new changeset on top of the stack.
    pub fn record(&mut self) -> Checkpoint {
        let id = Checkpoint(self.next_id);
        self.next_id += 1;
        self.stack.push(Changeset { id, entries: HashMap::default() });
        debug!(target: "journal", checkpoint = id.0, "Opened changeset");
        id
    }

    /// Drop every changeset on top of and including `checkpoint`, erasing all
    /// tentative writes within them.
    ///
    /// ## Panics
    /// Panics if `checkpoint` does not identify an open changeset. Discarding
    /// a checkpoint twice, or one that was already committed, is a bug in the
    /// caller.
    pub fn discard(&mut self, checkpoint: Checkpoint) {
        let index = self.position(checkpoint);
        self.stack.truncate(index);
        debug!(target: "journal", checkpoint = checkpoint.0, "Discarded changesets");
    }

    /// Collapse every changeset on top of and including `checkpoint` into
    /// `checkpoint`'s parent layer with last-writer-wins semantics. The
    /// merged writes survive the next [Self::discard] boundary but are not
    /// flushed to the wrapped store.
    ///
    /// ## Panics
    /// Panics if `checkpoint` does not identify an open changeset.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        let index = self.position(checkpoint);
        let drained = self.stack.split_off(index);
        let parent = match index.checked_sub(1) {
            Some(parent_index) => &mut self.stack[parent_index].entries,
            None => &mut self.base,
        };
        for changeset in drained {
            parent.extend(changeset.entries);
        }
        debug!(target: "journal", checkpoint = checkpoint.0, "Committed changesets");
    }

    /// Flush every pending write to the wrapped store and clear all layers.
    ///
    /// Open changesets are first collapsed oldest-to-newest, so the flush
    /// applies one last-writer-wins entry per key: values via `set`,
    /// tombstones via `delete`. A tombstone for a key the wrapped store never
    /// held is skipped; any other backend error propagates unchanged, leaving
    /// the un-flushed remainder in place so a retry re-flushes idempotently.
    pub fn persist(&mut self) -> KvResult<()> {
        let drained = core::mem::take(&mut self.stack);
        for changeset in drained {
            self.base.extend(changeset.entries);
        }

        for (key, entry) in &self.base {
            match entry {
                JournalEntry::Value(value) => self.db.set(key, value.clone())?,
                JournalEntry::Deleted => match self.db.delete(key) {
                    Err(KvError::NotFound) => {}
                    other => other?,
                },
            }
        }
        debug!(target: "journal", entries = self.base.len(), "Persisted journal");
        self.base.clear();
        Ok(())
    }

    /// Returns the stack index of the given checkpoint, panicking when it is
    /// not open.
    fn position(&self, checkpoint: Checkpoint) -> usize {
        self.stack
            .iter()
            .position(|changeset| changeset.id == checkpoint)
            .unwrap_or_else(|| panic!("unknown journal checkpoint: {checkpoint:?}"))
    }

    /// Looks a key up in the journal layers, without consulting the wrapped
    /// store. `Some(None)` means a tombstone shadows the key.
    fn lookup(&self, key: &[u8]) -> Option<Option<Bytes>> {
        self.stack
            .iter()
            .rev()
            .find_map(|changeset| changeset.entries.get(key))
            .or_else(|| self.base.get(key))
            .map(|entry| match entry {
                JournalEntry::Value(value) => Some(value.clone()),
                JournalEntry::Deleted => None,
            })
    }

    /// Returns a mutable reference to the topmost layer.
    fn top(&mut self) -> &mut HashMap<Vec<u8>, JournalEntry> {
        match self.stack.last_mut() {
            Some(changeset) => &mut changeset.entries,
            None => &mut self.base,
        }
    }
}

impl<B> KeyValueStore for JournalStore<B>
where
    B: KeyValueStore,
{
    fn get(&self, key: &[u8]) -> KvResult<Option<Bytes>> {
        match self.lookup(key) {
            Some(hit) => Ok(hit),
            None => self.db.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Bytes) -> KvResult<()> {
        self.top().insert(key.to_vec(), JournalEntry::Value(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> KvResult<()> {
        if !self.contains(key)? {
            return Err(KvError::NotFound);
        }
        self.top().insert(key.to_vec(), JournalEntry::Deleted);
        Ok(())
    }

    fn contains(&self, key: &[u8]) -> KvResult<bool> {
        match self.lookup(key) {
            Some(hit) => Ok(hit.is_some()),
            None => self.db.contains(key),
        }
    }
}
