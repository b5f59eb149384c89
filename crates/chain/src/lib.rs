#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod config;
pub use config::{ChainConfig, block_hash};

mod error;
pub use error::ChainError;

mod events;
pub use events::{EVENT_CHANNEL_CAPACITY, EventScope};

mod producer;
pub use producer::VirtualChain;
