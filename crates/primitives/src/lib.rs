#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod block;
pub use block::{LatestBlockInfo, VirtualBlock, VirtualTransaction, chain_id_from_name};

mod log;
pub use log::{EgtxLog, matches_log};

mod record;
pub use record::{MAX_NFT_COMMITMENT_LEN, NftCapability, TokenInfoRecord, ValueRecord};

mod codec;
pub use codec::{
    LogPayload, TAGGED_PREFIX, TaggedHeader, parse_tagged_script, pushed_data, right_align,
};

mod error;
pub use error::CodecError;
