#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::StoreError;

mod traits;
pub use traits::{LogStore, MatchPredicate};

mod mem;
pub use mem::MemoryStore;
