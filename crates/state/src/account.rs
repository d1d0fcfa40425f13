//! This module contains the [Account] record.

use crate::constants::{EMPTY_CODE_HASH, EMPTY_ROOT_HASH};
use alloy_primitives::{B256, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// An account record as stored in the account trie under `keccak(address)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct Account {
    /// The number of state-changing operations issued by the account.
    pub nonce: U256,
    /// Account balance.
    pub balance: U256,
    /// Root of the account's storage trie; [EMPTY_ROOT_HASH] when the
    /// account has no storage.
    pub storage_root: B256,
    /// The keccak-256 of the account's code; [EMPTY_CODE_HASH] when the
    /// account has no code.
    pub code_hash: B256,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            nonce: U256::ZERO,
            balance: U256::ZERO,
            storage_root: EMPTY_ROOT_HASH,
            code_hash: EMPTY_CODE_HASH,
        }
    }
}

impl Account {
    /// Returns whether the account has a non-zero nonce or carries code.
    pub fn has_code_or_nonce(&self) -> bool {
        !self.nonce.is_zero() || self.code_hash != EMPTY_CODE_HASH
    }

    /// Returns whether the account is empty: zero nonce, zero balance and no
    /// code.
    pub fn is_empty(&self) -> bool {
        !self.has_code_or_nonce() && self.balance.is_zero()
    }
}
