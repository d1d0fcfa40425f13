//! This module contains the [ExecutionContext] supplied to a state at
//! construction.

use crate::constants::MAX_ANCESTOR_DEPTH;
use alloc::vec::Vec;
use alloy_primitives::{Address, B256, U256};

/// The block environment a state is executed within. The state facade only
/// reads these values; producing them is the block processor's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    /// The beneficiary of block rewards and fees.
    pub coinbase: Address,
    /// The timestamp of the current block, in seconds.
    pub timestamp: u64,
    /// The number of the current block.
    pub block_number: u64,
    /// The difficulty of the current block.
    pub difficulty: U256,
    /// The gas limit of the current block.
    pub gas_limit: u64,
    /// Hashes of the most recent ancestor blocks, most recent first.
    pub prev_hashes: Vec<B256>,
}

impl ExecutionContext {
    /// Returns the hash of the ancestor block with the given number, or
    /// [None] when the block is outside the available window.
    pub fn ancestor_hash(&self, block_number: u64) -> Option<B256> {
        let depth = self.block_number.checked_sub(block_number)?.checked_sub(1)?;
        if depth >= MAX_ANCESTOR_DEPTH || depth >= self.prev_hashes.len() as u64 {
            return None;
        }
        Some(self.prev_hashes[depth as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_context() -> ExecutionContext {
        ExecutionContext {
            block_number: 100,
            prev_hashes: (1u8..=4).map(B256::with_last_byte).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parent_hash_is_first() {
        let context = new_context();
        assert_eq!(context.ancestor_hash(99), Some(B256::with_last_byte(1)));
        assert_eq!(context.ancestor_hash(96), Some(B256::with_last_byte(4)));
    }

    #[test]
    fn test_out_of_window_is_none() {
        let context = new_context();
        // The current block and anything after it have no ancestor hash.
        assert_eq!(context.ancestor_hash(100), None);
        assert_eq!(context.ancestor_hash(101), None);
        // Deeper than the available history.
        assert_eq!(context.ancestor_hash(95), None);
    }

    #[test]
    fn test_depth_limit() {
        let context = ExecutionContext {
            block_number: 1000,
            prev_hashes: (0..512).map(|index| B256::with_last_byte(index as u8)).collect(),
            ..Default::default()
        };
        assert!(context.ancestor_hash(1000 - MAX_ANCESTOR_DEPTH).is_some());
        assert_eq!(context.ancestor_hash(1000 - MAX_ANCESTOR_DEPTH - 1), None);
    }
}
