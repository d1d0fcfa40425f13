//! This module contains the [State] facade tying the journal, the account
//! trie and the account database together.

use crate::{AccountStore, ExecutionContext, StateResult, TrieAccountDB};
use alloc::rc::Rc;
use alloy_primitives::{Address, B256, U256};
use core::cell::RefCell;
use sable_kv::{Checkpoint, JournalStore, KeyValueStore, SharedStore};
use sable_mpt::SecureTrie;

/// A recoverable point in a state's history: the root at the time the
/// snapshot was taken paired with the journal changeset it opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// The state root at the time of the snapshot.
    pub root: B256,
    /// The journal changeset opened by the snapshot.
    pub checkpoint: Checkpoint,
}

/// The world-state facade.
///
/// A [State] owns a [JournalStore] over the supplied backing store; the
/// keccak-keyed account trie and the per-account storage tries write through
/// that journal, so a whole span of mutations can be erased by rebinding the
/// trie root and discarding the journal layers ([Self::revert]), kept
/// ([Self::commit]) or flushed to the backing store ([Self::persist]).
///
/// The account database implementation is pluggable through the `A` type
/// parameter and defaults to [TrieAccountDB]; the execution engine sitting on
/// top supplies its own computation and transaction machinery.
#[derive(Debug)]
pub struct State<B, A = TrieAccountDB>
where
    B: KeyValueStore + 'static,
    A: AccountStore,
{
    /// The journal over the backing store. The tries hold coerced handles to
    /// this same cell.
    journal: Rc<RefCell<JournalStore<B>>>,
    /// The block environment.
    context: ExecutionContext,
    /// The account database.
    accounts: A,
}

impl<B, A> State<B, A>
where
    B: KeyValueStore + 'static,
    A: AccountStore,
{
    /// Creates a new [State] over the given backing store, bound to an
    /// existing state root.
    pub fn new(db: B, context: ExecutionContext, root: B256) -> Self {
        let journal = Rc::new(RefCell::new(JournalStore::new(db)));
        let shared: SharedStore = journal.clone();
        let accounts = A::build(SecureTrie::from_root(shared.clone(), root), shared);
        Self { journal, context, accounts }
    }

    /// Creates a new [State] with an empty world state.
    pub fn empty(db: B, context: ExecutionContext) -> Self {
        Self::new(db, context, sable_mpt::EMPTY_ROOT_HASH)
    }

    /// Returns the current state root.
    pub fn root(&self) -> B256 {
        self.accounts.state_root()
    }

    /// Returns a reference to the account database.
    pub const fn account_db(&self) -> &A {
        &self.accounts
    }

    /// Returns a mutable reference to the account database.
    pub fn account_db_mut(&mut self) -> &mut A {
        &mut self.accounts
    }

    /// Returns the execution context the state was constructed with.
    pub const fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Returns the current `coinbase` from the execution context.
    pub const fn coinbase(&self) -> Address {
        self.context.coinbase
    }

    /// Returns the current `timestamp` from the execution context.
    pub const fn timestamp(&self) -> u64 {
        self.context.timestamp
    }

    /// Returns the current `block_number` from the execution context.
    pub const fn block_number(&self) -> u64 {
        self.context.block_number
    }

    /// Returns the current `difficulty` from the execution context.
    pub const fn difficulty(&self) -> U256 {
        self.context.difficulty
    }

    /// Returns the current `gas_limit` from the execution context.
    pub const fn gas_limit(&self) -> u64 {
        self.context.gas_limit
    }

    /// Returns the hash of the ancestor block with the given number, or
    /// [None] when it is outside the available window.
    pub fn ancestor_hash(&self, block_number: u64) -> Option<B256> {
        self.context.ancestor_hash(block_number)
    }

    /// Captures the current root and opens a new journal changeset.
    pub fn snapshot(&mut self) -> Snapshot {
        let root = self.root();
        let checkpoint = self.journal.borrow_mut().record();
        debug!(target: "state", ?root, "Captured snapshot");
        Snapshot { root, checkpoint }
    }

    /// Reverts to the given snapshot: the journal layers recorded since are
    /// discarded and the account database is rebuilt over the restored root,
    /// dropping every record decoded since the snapshot.
    pub fn revert(&mut self, snapshot: Snapshot) {
        self.journal.borrow_mut().discard(snapshot.checkpoint);
        let shared: SharedStore = self.journal.clone();
        self.accounts = A::build(SecureTrie::from_root(shared.clone(), snapshot.root), shared);
        debug!(target: "state", root = ?snapshot.root, "Reverted to snapshot");
    }

    /// Commits the journal up to the given snapshot, merging every changeset
    /// recorded since it into the snapshot's parent layer. The snapshot root
    /// plays no part here; commit only collapses journal layers.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.journal.borrow_mut().commit(snapshot.checkpoint);
    }

    /// Flushes the journal to the backing store.
    pub fn persist(&mut self) -> StateResult<()> {
        Ok(self.journal.borrow_mut().persist()?)
    }
}

impl<B, A> Drop for State<B, A>
where
    B: KeyValueStore + 'static,
    A: AccountStore,
{
    fn drop(&mut self) {
        // Leaked changesets are not an error, but they point at a caller
        // that forgot to commit or revert an open snapshot.
        let depth = self.journal.borrow().depth();
        if depth != 0 {
            debug!(target: "state", depth, "State dropped with open journal changesets");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EMPTY_CODE_HASH, EMPTY_ROOT_HASH};
    use alloy_primitives::{address, bytes, keccak256, uint, Bytes};
    use sable_kv::MemoryStore;

    const ALICE: Address = address!("0000000000000000000000000000000000000001");
    const BOB: Address = address!("0000000000000000000000000000000000000002");

    fn new_state() -> State<MemoryStore> {
        State::empty(MemoryStore::new(), ExecutionContext::default())
    }

    #[test]
    fn test_fresh_state() {
        let mut state = new_state();
        assert_eq!(state.root(), EMPTY_ROOT_HASH);
        assert_eq!(state.account_db_mut().get_balance(ALICE).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_balance_write_is_idempotent_on_root() {
        let mut state = new_state();
        state.account_db_mut().set_balance(ALICE, uint!(100_U256)).unwrap();
        assert_eq!(state.account_db_mut().get_balance(ALICE).unwrap(), uint!(100_U256));

        let first_root = state.root();
        state.account_db_mut().set_balance(ALICE, uint!(100_U256)).unwrap();
        assert_eq!(state.root(), first_root);
    }

    #[test]
    fn test_storage_zero_write_deletes() {
        let mut state = new_state();
        let db = state.account_db_mut();
        db.set_storage(ALICE, U256::ZERO, uint!(42_U256)).unwrap();
        db.set_storage(ALICE, uint!(1_U256), uint!(7_U256)).unwrap();
        db.set_storage(ALICE, U256::ZERO, U256::ZERO).unwrap();

        assert_eq!(db.get_storage(ALICE, U256::ZERO).unwrap(), U256::ZERO);
        assert_eq!(db.get_storage(ALICE, uint!(1_U256)).unwrap(), uint!(7_U256));
    }

    #[test]
    fn test_revert_restores_root_and_values() {
        let mut state = new_state();
        state.account_db_mut().set_balance(ALICE, uint!(1_U256)).unwrap();
        let root_before = state.root();

        let snapshot = state.snapshot();
        state.account_db_mut().set_balance(ALICE, uint!(500_U256)).unwrap();
        state.account_db_mut().set_code(BOB, bytes!("6000")).unwrap();
        state.account_db_mut().set_storage(BOB, U256::ZERO, uint!(9_U256)).unwrap();
        state.revert(snapshot);

        assert_eq!(state.root(), root_before);
        assert_eq!(state.account_db_mut().get_balance(ALICE).unwrap(), uint!(1_U256));
        assert_eq!(state.account_db_mut().get_code(BOB).unwrap(), Bytes::new());
        assert_eq!(state.account_db_mut().get_storage(BOB, U256::ZERO).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_revert_from_fresh_state() {
        let mut state = new_state();
        let snapshot = state.snapshot();
        state.account_db_mut().set_balance(ALICE, uint!(500_U256)).unwrap();
        state.revert(snapshot);

        assert_eq!(state.root(), EMPTY_ROOT_HASH);
        assert_eq!(state.account_db_mut().get_balance(ALICE).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_commit_then_persist_materializes_writes() {
        let mut state = new_state();
        let snapshot = state.snapshot();
        state.account_db_mut().set_balance(ALICE, uint!(100_U256)).unwrap();
        state.commit(snapshot);
        state.persist().unwrap();

        let root = state.root();
        assert!(!state.journal.borrow().inner().is_empty());

        // A fresh state over the persisted store sees the committed world.
        let persisted = state.journal.borrow().inner().clone();
        drop(state);
        let mut reopened: State<MemoryStore> =
            State::new(persisted, ExecutionContext::default(), root);
        assert_eq!(reopened.root(), root);
        assert_eq!(reopened.account_db_mut().get_balance(ALICE).unwrap(), uint!(100_U256));
    }

    #[test]
    fn test_nested_snapshots() {
        let mut state = new_state();
        let root_before = state.root();

        let outer = state.snapshot();
        state.account_db_mut().set_balance(ALICE, uint!(1_U256)).unwrap();
        let inner = state.snapshot();
        state.account_db_mut().set_balance(BOB, uint!(2_U256)).unwrap();
        state.commit(inner);
        state.revert(outer);

        assert_eq!(state.root(), root_before);
        assert_eq!(state.account_db_mut().get_balance(ALICE).unwrap(), U256::ZERO);
        assert_eq!(state.account_db_mut().get_balance(BOB).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_code_lifecycle_through_snapshots() {
        let mut state = new_state();
        let db = state.account_db_mut();
        db.set_code(ALICE, bytes!("616263")).unwrap();
        let code_hash = db.get_code_hash(ALICE).unwrap();
        assert_eq!(code_hash, keccak256(bytes!("616263")));

        db.delete_code(ALICE).unwrap();
        assert_eq!(db.get_code(ALICE).unwrap(), Bytes::new());
        assert_eq!(db.get_code_hash(ALICE).unwrap(), EMPTY_CODE_HASH);
    }

    #[test]
    fn test_determinism_across_states() {
        let run = || {
            let mut state = new_state();
            let db = state.account_db_mut();
            db.set_balance(ALICE, uint!(100_U256)).unwrap();
            db.set_storage(ALICE, U256::ZERO, uint!(42_U256)).unwrap();
            db.set_code(BOB, bytes!("6000")).unwrap();
            db.increment_nonce(BOB).unwrap();
            db.delete_account(ALICE).unwrap();
            state.root()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_snapshot_captures_root_before_recording() {
        let mut state = new_state();
        state.account_db_mut().set_balance(ALICE, uint!(5_U256)).unwrap();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.root, state.root());
    }

    #[test]
    fn test_sequential_reverts_unwind_in_order() {
        let mut state = new_state();
        let first = state.snapshot();
        state.account_db_mut().set_balance(ALICE, uint!(1_U256)).unwrap();
        let second = state.snapshot();
        state.account_db_mut().set_balance(ALICE, uint!(2_U256)).unwrap();

        state.revert(second);
        assert_eq!(state.account_db_mut().get_balance(ALICE).unwrap(), uint!(1_U256));
        state.revert(first);
        assert_eq!(state.account_db_mut().get_balance(ALICE).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_context_accessors() {
        let context = ExecutionContext {
            coinbase: ALICE,
            timestamp: 12,
            block_number: 34,
            difficulty: uint!(56_U256),
            gas_limit: 78,
            prev_hashes: alloc::vec![B256::repeat_byte(0x01)],
        };
        let state: State<MemoryStore> =
            State::empty(MemoryStore::new(), context.clone());

        assert_eq!(state.coinbase(), ALICE);
        assert_eq!(state.timestamp(), 12);
        assert_eq!(state.block_number(), 34);
        assert_eq!(state.difficulty(), uint!(56_U256));
        assert_eq!(state.gas_limit(), 78);
        assert_eq!(state.ancestor_hash(33), Some(B256::repeat_byte(0x01)));
        assert_eq!(state.context(), &context);
    }
}
