//! The eth-namespace API surface.

use crate::{FilterChanges, FilterCriteria, SubscriptionKind};
use alloy_primitives::{B256, U64};
use heron_primitives::EgtxLog;
use jsonrpsee::{
    core::{RpcResult, SubscriptionResult},
    proc_macros::rpc,
};

/// The filter and subscription endpoints served over the virtual chain.
#[rpc(server, namespace = "eth")]
pub trait EthApi {
    /// The chain id word derived from the chain name.
    #[method(name = "chainId")]
    async fn chain_id(&self) -> RpcResult<B256>;

    /// Height of the latest virtual block.
    #[method(name = "blockNumber")]
    async fn block_number(&self) -> RpcResult<U64>;

    /// Installs a log filter; returns its id.
    #[method(name = "newFilter")]
    async fn new_filter(&self, criteria: FilterCriteria) -> RpcResult<U64>;

    /// Installs a block filter; returns its id.
    #[method(name = "newBlockFilter")]
    async fn new_block_filter(&self) -> RpcResult<U64>;

    /// Drains the events a filter buffered since the last poll.
    #[method(name = "getFilterChanges")]
    async fn filter_changes(&self, id: U64) -> RpcResult<FilterChanges>;

    /// Re-runs an installed log filter's criteria over the store.
    #[method(name = "getFilterLogs")]
    async fn filter_logs(&self, id: U64) -> RpcResult<Vec<EgtxLog>>;

    /// Removes a filter; returns whether it existed.
    #[method(name = "uninstallFilter")]
    async fn uninstall_filter(&self, id: U64) -> RpcResult<bool>;

    /// One-shot log query.
    #[method(name = "getLogs")]
    async fn get_logs(&self, criteria: FilterCriteria) -> RpcResult<Vec<EgtxLog>>;

    /// Streams new heads or matching logs as they are produced.
    #[subscription(name = "subscribe" => "subscription", unsubscribe = "unsubscribe", item = serde_json::Value)]
    async fn subscribe(
        &self,
        kind: SubscriptionKind,
        criteria: Option<FilterCriteria>,
    ) -> SubscriptionResult;
}
