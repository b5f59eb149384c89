#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::{ConvertError, ScannerError};

mod cache;
pub use cache::KnownTxCache;

mod convert;
pub use convert::convert_tagged_tx;

mod scanner;
pub use scanner::{KNOWN_TX_CACHE_SIZE, Scanner, confirmations};
