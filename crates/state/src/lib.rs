#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
extern crate tracing;

mod errors;
pub use errors::{CacheError, CacheResult, StateError, StateResult};

mod constants;
pub use constants::{EMPTY_CODE_HASH, EMPTY_ROOT_HASH, MAX_ANCESTOR_DEPTH};

mod account;
pub use account::Account;

mod cached;
pub use cached::{CachedRlpStore, DEFAULT_CACHE_CAPACITY};

mod context;
pub use context::ExecutionContext;

mod traits;
pub use traits::AccountStore;

mod account_db;
pub use account_db::TrieAccountDB;

mod state;
pub use state::{Snapshot, State};
