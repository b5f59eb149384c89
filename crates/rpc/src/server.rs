//! Server-side implementation of the eth namespace.

use crate::{
    EthApiServer, FilterBackend, FilterChanges, FilterCriteria, FilterRegistry, SubscriptionKind,
};
use alloy_primitives::{B256, U64};
use async_trait::async_trait;
use heron_chain::EventScope;
use heron_client::ChainClient;
use heron_primitives::{EgtxLog, matches_log};
use heron_storage::LogStore;
use jsonrpsee::{
    core::{RpcResult, SubscriptionResult},
    server::{PendingSubscriptionSink, ServerHandle, SubscriptionMessage},
    types::ErrorObjectOwned,
};
use std::net::SocketAddr;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

/// The eth-namespace server: filter state, log retrieval and event streams
/// behind one handler.
#[derive(Debug)]
pub struct EthRpc<C, S> {
    chain_id: B256,
    backend: FilterBackend<C, S>,
    registry: FilterRegistry,
    events: EventScope,
}

impl<C: ChainClient + 'static, S: LogStore + 'static> EthRpc<C, S> {
    /// Creates the handler over a backend and the producer's event scope.
    pub fn new(
        chain_id: B256,
        backend: FilterBackend<C, S>,
        registry: FilterRegistry,
        events: EventScope,
    ) -> Self {
        Self { chain_id, backend, registry, events }
    }

    /// Launches the RPC server on the given socket address.
    pub async fn launch(self, socket: SocketAddr) -> std::io::Result<ServerHandle> {
        let server = jsonrpsee::server::ServerBuilder::default().build(socket).await?;
        info!(target: "rpc", %socket, "rpc server listening");
        Ok(server.start(self.into_rpc()))
    }
}

#[async_trait]
impl<C: ChainClient + 'static, S: LogStore + 'static> EthApiServer for EthRpc<C, S> {
    async fn chain_id(&self) -> RpcResult<B256> {
        Ok(self.chain_id)
    }

    async fn block_number(&self) -> RpcResult<U64> {
        let height = self.backend.latest_height().map_err(ErrorObjectOwned::from)?;
        Ok(U64::from(height))
    }

    async fn new_filter(&self, criteria: FilterCriteria) -> RpcResult<U64> {
        Ok(U64::from(self.registry.install_log_filter(criteria)))
    }

    async fn new_block_filter(&self) -> RpcResult<U64> {
        Ok(U64::from(self.registry.install_block_filter()))
    }

    async fn filter_changes(&self, id: U64) -> RpcResult<FilterChanges> {
        self.registry.poll_changes(id.to::<u64>()).map_err(Into::into)
    }

    async fn filter_logs(&self, id: U64) -> RpcResult<Vec<EgtxLog>> {
        let criteria = self.registry.log_criteria(id.to::<u64>())?;
        self.backend.logs(&criteria).await.map_err(Into::into)
    }

    async fn uninstall_filter(&self, id: U64) -> RpcResult<bool> {
        Ok(self.registry.uninstall(id.to::<u64>()))
    }

    async fn get_logs(&self, criteria: FilterCriteria) -> RpcResult<Vec<EgtxLog>> {
        self.backend.logs(&criteria).await.map_err(Into::into)
    }

    async fn subscribe(
        &self,
        sink: PendingSubscriptionSink,
        kind: SubscriptionKind,
        criteria: Option<FilterCriteria>,
    ) -> SubscriptionResult {
        match kind {
            SubscriptionKind::NewHeads => {
                let mut rx = self.events.subscribe_heads();
                tokio::spawn(async move {
                    let Ok(sub) = sink.accept().await else { return };
                    let id = sub.subscription_id();
                    loop {
                        match rx.recv().await {
                            Ok(block) => {
                                let Ok(message) =
                                    SubscriptionMessage::new("eth_subscription", id.clone(), &block)
                                else {
                                    break;
                                };
                                if sub.send(message).await.is_err() {
                                    break;
                                }
                            }
                            Err(RecvError::Lagged(missed)) => {
                                debug!(target: "rpc", missed, "head subscriber fell behind");
                            }
                            Err(RecvError::Closed) => break,
                        }
                    }
                });
            }
            SubscriptionKind::Logs => {
                let criteria = criteria.unwrap_or_default();
                let mut rx = self.events.subscribe_logs();
                tokio::spawn(async move {
                    let Ok(sub) = sink.accept().await else { return };
                    let id = sub.subscription_id();
                    loop {
                        match rx.recv().await {
                            Ok(log) => {
                                if !matches_log(
                                    &log.address,
                                    &log.topics,
                                    criteria.address.as_slice(),
                                    &criteria.topics,
                                ) {
                                    continue;
                                }
                                let Ok(message) =
                                    SubscriptionMessage::new("eth_subscription", id.clone(), &log)
                                else {
                                    break;
                                };
                                if sub.send(message).await.is_err() {
                                    break;
                                }
                            }
                            Err(RecvError::Lagged(missed)) => {
                                debug!(target: "rpc", missed, "log subscriber fell behind");
                            }
                            Err(RecvError::Closed) => break,
                        }
                    }
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};
    use heron_client::MockChainClient;
    use heron_primitives::{VirtualBlock, VirtualTransaction};
    use heron_storage::MemoryStore;
    use std::{sync::Arc, time::Duration};

    fn handler() -> (EthRpc<MockChainClient, MemoryStore>, EventScope, Arc<MemoryStore>) {
        let client = Arc::new(MockChainClient::default());
        let store = Arc::new(MemoryStore::default());
        let events = EventScope::default();
        let backend = FilterBackend::new(client, store.clone());
        let registry = FilterRegistry::new(events.clone());
        let chain_id = heron_primitives::chain_id_from_name("testchain");
        (EthRpc::new(chain_id, backend, registry, events.clone()), events, store)
    }

    #[tokio::test]
    async fn block_number_follows_the_store() {
        let (rpc, _events, store) = handler();
        assert_eq!(rpc.block_number().await.unwrap(), U64::ZERO);

        let block = VirtualBlock { number: 4, hash: B256::repeat_byte(4), ..Default::default() };
        store.add_block(&block, &[]).unwrap();
        assert_eq!(rpc.block_number().await.unwrap(), U64::from(4));
    }

    #[tokio::test(start_paused = true)]
    async fn filter_lifecycle_over_the_api() {
        let (rpc, events, _store) = handler();
        let id = rpc.new_block_filter().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let block = VirtualBlock { number: 1, hash: B256::repeat_byte(1), ..Default::default() };
        events.publish_block(&block, &[]);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let changes = rpc.filter_changes(id).await.unwrap();
        assert_eq!(changes, FilterChanges::Hashes(vec![B256::repeat_byte(1)]));

        assert!(rpc.uninstall_filter(id).await.unwrap());
        assert!(rpc.filter_changes(id).await.is_err());
    }

    #[tokio::test]
    async fn filter_logs_rejects_block_filters() {
        let (rpc, _events, _store) = handler();
        let id = rpc.new_block_filter().await.unwrap();
        assert!(rpc.filter_logs(id).await.is_err());
    }

    #[tokio::test]
    async fn get_logs_round_trip() {
        let (rpc, _events, store) = handler();
        let tx = VirtualTransaction {
            hash: B256::repeat_byte(1),
            block_number: 1,
            log: EgtxLog {
                address: Address::repeat_byte(0xaa),
                tx_hash: B256::repeat_byte(1),
                block_number: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let block = VirtualBlock {
            number: 1,
            hash: B256::repeat_byte(1),
            tx_hashes: vec![tx.hash],
            ..Default::default()
        };
        store.add_block(&block, &[tx]).unwrap();

        let logs = rpc.get_logs(FilterCriteria::default()).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].address, Address::repeat_byte(0xaa));
    }
}
