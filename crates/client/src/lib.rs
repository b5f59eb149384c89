#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::{ClientError, ClientResult};

mod types;
pub use types::{
    RawTransaction, ScriptKind, ScriptPubKey, TokenData, TokenNft, TxInput, TxOut, TxOutput,
    VerboseBlock, WalletTransaction,
};

mod traits;
pub use traits::ChainClient;

mod http;
pub use http::{HttpChainClient, HttpClientConfig};

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockChainClient;
