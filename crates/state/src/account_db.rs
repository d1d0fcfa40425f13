//! This module contains [TrieAccountDB], the account database over the
//! keccak-keyed account trie and a raw node/code store.

use crate::{
    constants::{EMPTY_CODE_HASH, EMPTY_ROOT_HASH},
    Account, AccountStore, CachedRlpStore, StateResult,
};
use alloc::vec::Vec;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable};
use sable_kv::{KeyValueStore, SharedStore};
use sable_mpt::SecureTrie;

/// The account database backing the state facade.
///
/// Account records are read and written through a [CachedRlpStore] over the
/// keccak-keyed account trie, with the zero account as the default for
/// addresses never written: accounts spring into existence on first read.
/// Code blobs and storage-trie nodes live in the raw store, addressed by
/// keccak; a mutation of a storage slot freshly materializes the account's
/// storage trie from its recorded root and folds the new root back into the
/// record, so no back-references between the layers are needed.
#[derive(Debug)]
pub struct TrieAccountDB {
    /// Decoded account records over the account trie.
    accounts: CachedRlpStore<SecureTrie, Account>,
    /// Code blobs and storage-trie nodes, keyed by keccak.
    raw: SharedStore,
}

impl TrieAccountDB {
    /// Fetches the record of the given account, defaulting to the zero
    /// account.
    fn account(&mut self, address: Address) -> StateResult<Account> {
        Ok(self.accounts.get(address.as_slice())?)
    }

    /// Rewrites the record of the given account.
    fn set_account(&mut self, address: Address, account: Account) -> StateResult<()> {
        Ok(self.accounts.set(address.as_slice(), account)?)
    }

    /// Materializes the account's storage trie from its recorded root.
    fn storage_trie(&mut self, address: Address) -> StateResult<(Account, SecureTrie)> {
        let account = self.account(address)?;
        let storage = SecureTrie::from_root(self.raw.clone(), account.storage_root);
        Ok((account, storage))
    }
}

impl AccountStore for TrieAccountDB {
    fn build(accounts: SecureTrie, raw: SharedStore) -> Self {
        Self { accounts: CachedRlpStore::new(accounts, Some(Account::default())), raw }
    }

    fn state_root(&self) -> B256 {
        self.accounts.inner().root()
    }

    fn get_storage(&mut self, address: Address, slot: U256) -> StateResult<U256> {
        let (_, storage) = self.storage_trie(address)?;
        match storage.get(&slot.to_be_bytes::<32>())? {
            Some(encoded) => Ok(U256::decode(&mut encoded.as_ref())?),
            None => Ok(U256::ZERO),
        }
    }

    fn set_storage(&mut self, address: Address, slot: U256, value: U256) -> StateResult<()> {
        let (mut account, mut storage) = self.storage_trie(address)?;
        let key = slot.to_be_bytes::<32>();
        if value.is_zero() {
            storage.delete(&key)?;
        } else {
            let mut encoded = Vec::with_capacity(value.length());
            value.encode(&mut encoded);
            storage.set(&key, encoded.into())?;
        }

        account.storage_root = storage.root();
        self.set_account(address, account)
    }

    fn delete_storage(&mut self, address: Address) -> StateResult<()> {
        let mut account = self.account(address)?;
        account.storage_root = EMPTY_ROOT_HASH;
        self.set_account(address, account)
    }

    fn get_balance(&mut self, address: Address) -> StateResult<U256> {
        Ok(self.account(address)?.balance)
    }

    fn set_balance(&mut self, address: Address, balance: U256) -> StateResult<()> {
        let mut account = self.account(address)?;
        account.balance = balance;
        self.set_account(address, account)
    }

    fn get_nonce(&mut self, address: Address) -> StateResult<U256> {
        Ok(self.account(address)?.nonce)
    }

    fn set_nonce(&mut self, address: Address, nonce: U256) -> StateResult<()> {
        let mut account = self.account(address)?;
        account.nonce = nonce;
        self.set_account(address, account)
    }

    fn get_code(&mut self, address: Address) -> StateResult<Bytes> {
        let code_hash = self.get_code_hash(address)?;
        // An absent blob is not an error: the no-code account shape resolves
        // here through the empty-keccak hash.
        Ok(self.raw.borrow().get(code_hash.as_slice())?.unwrap_or_default())
    }

    fn set_code(&mut self, address: Address, code: Bytes) -> StateResult<()> {
        let mut account = self.account(address)?;
        let code_hash = keccak256(&code);
        self.raw.borrow_mut().set(code_hash.as_slice(), code)?;
        account.code_hash = code_hash;
        self.set_account(address, account)
    }

    fn get_code_hash(&mut self, address: Address) -> StateResult<B256> {
        Ok(self.account(address)?.code_hash)
    }

    fn delete_code(&mut self, address: Address) -> StateResult<()> {
        let mut account = self.account(address)?;
        account.code_hash = EMPTY_CODE_HASH;
        self.set_account(address, account)
    }

    fn account_exists(&mut self, address: Address) -> StateResult<bool> {
        Ok(self.account(address)? != Account::default())
    }

    fn touch_account(&mut self, address: Address) -> StateResult<()> {
        let account = self.account(address)?;
        self.set_account(address, account)
    }

    fn delete_account(&mut self, address: Address) -> StateResult<()> {
        Ok(self.accounts.delete(address.as_slice())?)
    }
}
