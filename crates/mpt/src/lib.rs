#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
extern crate tracing;

mod errors;
pub use errors::{TrieError, TrieResult};

mod node;
pub use node::{NodeRef, TrieNode};

mod trie;
pub use trie::Trie;

mod secure;
pub use secure::SecureTrie;

pub use alloy_trie::{Nibbles, EMPTY_ROOT_HASH};
