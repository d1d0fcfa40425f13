//! Contains the [AccountStore] trait describing the world-state API the
//! state facade drives.

use crate::{constants::EMPTY_CODE_HASH, StateError, StateResult};
use alloy_primitives::{Address, Bytes, B256, I256, U256};
use sable_kv::SharedStore;
use sable_mpt::SecureTrie;

/// The world-state capabilities required of an account database: per-address
/// storage, balance, nonce, code, and account lifecycle queries.
///
/// Composite operations ([Self::delta_balance], [Self::increment_nonce],
/// [Self::account_has_code_or_nonce], [Self::account_is_empty]) are provided
/// as defaults over the primitive operations; implementations may override
/// them when they can do better.
pub trait AccountStore: core::fmt::Debug {
    /// Builds the store over the keccak-keyed account trie and the raw store
    /// holding code blobs and storage-trie nodes. The facade calls this at
    /// construction and again after a revert, when the record cache must be
    /// dropped and re-seated onto the restored trie.
    fn build(accounts: SecureTrie, raw: SharedStore) -> Self
    where
        Self: Sized;

    /// Returns the current root hash of the account trie.
    fn state_root(&self) -> B256;

    /// Returns the value of the given storage slot, or zero when the slot is
    /// unset.
    fn get_storage(&mut self, address: Address, slot: U256) -> StateResult<U256>;

    /// Sets the value of the given storage slot. Writing zero deletes the
    /// slot from the account's storage trie.
    fn set_storage(&mut self, address: Address, slot: U256, value: U256) -> StateResult<()>;

    /// Detaches the account from its storage trie, leaving it with the empty
    /// storage root.
    fn delete_storage(&mut self, address: Address) -> StateResult<()>;

    /// Returns the balance of the account.
    fn get_balance(&mut self, address: Address) -> StateResult<U256>;

    /// Sets the balance of the account.
    fn set_balance(&mut self, address: Address, balance: U256) -> StateResult<()>;

    /// Returns the nonce of the account.
    fn get_nonce(&mut self, address: Address) -> StateResult<U256>;

    /// Sets the nonce of the account.
    fn set_nonce(&mut self, address: Address, nonce: U256) -> StateResult<()>;

    /// Returns the account's code, or empty bytes when it has none.
    fn get_code(&mut self, address: Address) -> StateResult<Bytes>;

    /// Stores `code` content-addressed by its keccak and points the account
    /// at it.
    fn set_code(&mut self, address: Address, code: Bytes) -> StateResult<()>;

    /// Returns the keccak-256 of the account's code.
    fn get_code_hash(&mut self, address: Address) -> StateResult<B256>;

    /// Detaches the account from its code. The blob itself stays in the
    /// content-addressed store.
    fn delete_code(&mut self, address: Address) -> StateResult<()>;

    /// Returns whether a record differing from the zero account is stored
    /// for the address.
    fn account_exists(&mut self, address: Address) -> StateResult<bool>;

    /// Re-assigns the account's record to itself, anchoring it in whatever
    /// caches sit between the caller and the trie.
    fn touch_account(&mut self, address: Address) -> StateResult<()>;

    /// Removes the account's record from the account trie.
    fn delete_account(&mut self, address: Address) -> StateResult<()>;

    /// Adjusts the balance of the account by a signed delta.
    fn delta_balance(&mut self, address: Address, delta: I256) -> StateResult<()> {
        let balance = self.get_balance(address)?;
        let adjusted = if delta.is_negative() {
            balance.checked_sub(delta.unsigned_abs())
        } else {
            balance.checked_add(delta.unsigned_abs())
        }
        .ok_or(StateError::Overflow)?;
        self.set_balance(address, adjusted)
    }

    /// Increments the nonce of the account by one.
    fn increment_nonce(&mut self, address: Address) -> StateResult<()> {
        let nonce = self.get_nonce(address)?;
        let incremented = nonce.checked_add(U256::from(1)).ok_or(StateError::Overflow)?;
        self.set_nonce(address, incremented)
    }

    /// Returns whether the account has a non-zero nonce or carries code.
    fn account_has_code_or_nonce(&mut self, address: Address) -> StateResult<bool> {
        Ok(!self.get_nonce(address)?.is_zero() || self.get_code_hash(address)? != EMPTY_CODE_HASH)
    }

    /// Returns whether the account is empty: zero nonce, zero balance and no
    /// code.
    fn account_is_empty(&mut self, address: Address) -> StateResult<bool> {
        Ok(!self.account_has_code_or_nonce(address)? && self.get_balance(address)?.is_zero())
    }
}
