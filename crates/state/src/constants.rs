//! Canonical constants of the account state model.

use alloy_primitives::{b256, B256};

pub use sable_mpt::EMPTY_ROOT_HASH;

/// The keccak-256 of the empty byte string; the code hash of every account
/// without code.
pub const EMPTY_CODE_HASH: B256 =
    b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");

/// How far back ancestor block hashes are available from the execution
/// context.
pub const MAX_ANCESTOR_DEPTH: u64 = 255;
