#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
extern crate tracing;

mod errors;
pub use errors::{KvError, KvResult};

mod traits;
pub use traits::{KeyValueStore, SharedStore};

mod memory;
pub use memory::MemoryStore;

mod journal;
pub use journal::{Checkpoint, JournalStore};
