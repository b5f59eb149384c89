#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::FilterError;

mod types;
pub use types::{AddressFilter, FilterChanges, FilterCriteria, SubscriptionKind};

mod backend;
pub use backend::FilterBackend;

mod registry;
pub use registry::{FILTER_DEADLINE, FilterRegistry};

mod api;
pub use api::EthApiServer;

mod server;
pub use server::EthRpc;
