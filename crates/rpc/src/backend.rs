//! Log retrieval behind the filter API.

use crate::{FilterCriteria, FilterError};
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::hex;
use heron_client::ChainClient;
use heron_primitives::{EgtxLog, matches_log};
use heron_scanner::confirmations;
use heron_storage::{LogStore, StoreError};
use std::sync::Arc;

/// Cap on logs returned by an unconstrained query.
const MAX_UNFILTERED_LOGS: usize = 2000;

/// Resolves filter criteria against the store and stamps every returned log
/// with a live source-chain confirmation figure.
#[derive(Debug)]
pub struct FilterBackend<C, S> {
    client: Arc<C>,
    store: Arc<S>,
}

impl<C, S> Clone for FilterBackend<C, S> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone(), store: self.store.clone() }
    }
}

impl<C: ChainClient, S: LogStore> FilterBackend<C, S> {
    /// Creates a backend over the given client and store.
    pub fn new(client: Arc<C>, store: Arc<S>) -> Self {
        Self { client, store }
    }

    /// Height of the latest virtual block.
    pub fn latest_height(&self) -> Result<u64, FilterError> {
        Ok(self.store.latest_block_info()?.height)
    }

    /// Retrieves the logs matching `criteria`, confirmation-stamped.
    ///
    /// A criteria without addresses and topics walks the resolved range
    /// block by block, capped at [`MAX_UNFILTERED_LOGS`]; anything else goes
    /// through the store's indexed query.
    pub async fn logs(&self, criteria: &FilterCriteria) -> Result<Vec<EgtxLog>, FilterError> {
        let (from, to) = self.resolve_range(criteria)?;
        let addresses = criteria.address.as_slice();
        let unconstrained =
            addresses.is_empty() && criteria.topics.iter().all(Vec::is_empty);
        let mut logs = if unconstrained {
            self.walk_logs(from, to)?
        } else {
            self.store.query_logs(addresses, &criteria.topics, from, to, &|addr, topics| {
                matches_log(addr, topics, addresses, &criteria.topics)
            })?
        };
        self.stamp(&mut logs).await;
        Ok(logs)
    }

    /// Rewrites each log's confirmation word with the transaction's live
    /// source-chain depth.
    pub async fn stamp(&self, logs: &mut [EgtxLog]) {
        for log in logs {
            let depth = confirmations(self.client.as_ref(), &hex::encode(log.tx_hash)).await;
            log.stamp_confirmations(depth);
        }
    }

    /// Resolves the criteria's block constraint to an inclusive height
    /// range. A `blockHash` constraint wins over the range fields and must
    /// name a known block.
    fn resolve_range(&self, criteria: &FilterCriteria) -> Result<(u64, u64), FilterError> {
        if let Some(hash) = criteria.block_hash {
            let block = self.store.block_by_hash(&hash)?.ok_or(FilterError::UnknownBlock)?;
            return Ok((block.number, block.number));
        }
        let latest = self.latest_height()?;
        let from = resolve_tag(criteria.from_block, latest);
        let to = resolve_tag(criteria.to_block, latest);
        if from > to {
            return Err(FilterError::InvalidRange);
        }
        Ok((from, to))
    }

    fn walk_logs(&self, from: u64, to: u64) -> Result<Vec<EgtxLog>, FilterError> {
        let mut logs = Vec::new();
        for height in from..=to {
            for tx in self.store.txs_by_height(height, 0, usize::MAX)? {
                if logs.len() >= MAX_UNFILTERED_LOGS {
                    return Err(StoreError::TooManyResults.into());
                }
                logs.push(tx.log);
            }
        }
        Ok(logs)
    }
}

/// An absent tag and every head-relative tag resolve to the latest height;
/// `earliest` is the first virtual block.
fn resolve_tag(tag: Option<BlockNumberOrTag>, latest: u64) -> u64 {
    match tag {
        Some(BlockNumberOrTag::Number(n)) => n,
        Some(BlockNumberOrTag::Earliest) => 1,
        _ => latest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AddressFilter;
    use alloy_primitives::{Address, B256, U256};
    use heron_client::{MockChainClient, RawTransaction};
    use heron_primitives::{LogPayload, VirtualBlock, VirtualTransaction};
    use heron_storage::MemoryStore;

    const ADDR_A: Address = Address::repeat_byte(0xaa);
    const ADDR_B: Address = Address::repeat_byte(0xbb);

    fn tx_at(height: u64, index: u64, address: Address) -> VirtualTransaction {
        // Deterministic 32-byte tx hash doubling as the source txid.
        let mut hash = B256::ZERO;
        hash.0[0] = height as u8;
        hash.0[1] = index as u8;
        let data = LogPayload::default().encode();
        VirtualTransaction {
            hash,
            block_number: height,
            block_hash: B256::with_last_byte(height as u8),
            tx_index: index,
            log: EgtxLog {
                address,
                topics: vec![B256::with_last_byte(index as u8 + 1)],
                data,
                block_number: height,
                block_hash: B256::with_last_byte(height as u8),
                tx_hash: hash,
                tx_index: index,
            },
            ..Default::default()
        }
    }

    fn populated() -> (Arc<MockChainClient>, Arc<MemoryStore>) {
        let client = Arc::new(MockChainClient::default());
        let store = Arc::new(MemoryStore::default());
        for height in 1..=3 {
            let txs =
                vec![tx_at(height, 0, ADDR_A), tx_at(height, 1, ADDR_B)];
            let block = VirtualBlock {
                number: height,
                hash: B256::with_last_byte(height as u8),
                tx_hashes: txs.iter().map(|tx| tx.hash).collect(),
                ..Default::default()
            };
            store.add_block(&block, &txs).unwrap();
            for tx in &txs {
                client.insert_tx(RawTransaction {
                    txid: hex::encode(tx.hash),
                    confirmations: Some(height),
                    ..Default::default()
                });
            }
        }
        (client, store)
    }

    #[tokio::test]
    async fn unconstrained_query_walks_all_blocks() {
        let (client, store) = populated();
        let backend = FilterBackend::new(client, store);
        let logs = backend
            .logs(&FilterCriteria {
                from_block: Some(BlockNumberOrTag::Earliest),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(logs.len(), 6);
    }

    #[tokio::test]
    async fn default_range_is_the_latest_block() {
        let (client, store) = populated();
        let backend = FilterBackend::new(client, store);
        let logs = backend.logs(&FilterCriteria::default()).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|log| log.block_number == 3));
    }

    #[tokio::test]
    async fn address_filter_goes_through_the_index() {
        let (client, store) = populated();
        let backend = FilterBackend::new(client, store);
        let logs = backend
            .logs(&FilterCriteria {
                from_block: Some(BlockNumberOrTag::Earliest),
                address: AddressFilter::Single(ADDR_A),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(logs.len(), 3);
        assert!(logs.iter().all(|log| log.address == ADDR_A));
    }

    #[tokio::test]
    async fn block_hash_constraint_wins_and_must_exist() {
        let (client, store) = populated();
        let backend = FilterBackend::new(client, store);
        let logs = backend
            .logs(&FilterCriteria {
                block_hash: Some(B256::with_last_byte(2)),
                // Ignored in favor of the hash.
                from_block: Some(BlockNumberOrTag::Earliest),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|log| log.block_number == 2));

        let err = backend
            .logs(&FilterCriteria {
                block_hash: Some(B256::repeat_byte(0xde)),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FilterError::UnknownBlock));
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let (client, store) = populated();
        let backend = FilterBackend::new(client, store);
        let err = backend
            .logs(&FilterCriteria {
                from_block: Some(BlockNumberOrTag::Number(3)),
                to_block: Some(BlockNumberOrTag::Number(1)),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidRange));
    }

    #[tokio::test]
    async fn retrieved_logs_carry_live_confirmations() {
        let (client, store) = populated();
        let backend = FilterBackend::new(client.clone(), store);
        let criteria = FilterCriteria {
            block_hash: Some(B256::with_last_byte(2)),
            ..Default::default()
        };
        let logs = backend.logs(&criteria).await.unwrap();
        // Blocks were inserted with confirmations == height.
        let trailing = &logs[0].data[logs[0].data.len() - 32..];
        assert_eq!(U256::from_be_slice(trailing), U256::from(2));
    }

    #[tokio::test]
    async fn vanished_transactions_stamp_all_ones() {
        let client = Arc::new(MockChainClient::default());
        let store = Arc::new(MemoryStore::default());
        let tx = tx_at(1, 0, ADDR_A);
        let block = VirtualBlock {
            number: 1,
            hash: B256::with_last_byte(1),
            tx_hashes: vec![tx.hash],
            ..Default::default()
        };
        store.add_block(&block, &[tx]).unwrap();
        // The source chain never heard of this transaction.

        let backend = FilterBackend::new(client, store);
        let logs = backend.logs(&FilterCriteria::default()).await.unwrap();
        let trailing = &logs[0].data[logs[0].data.len() - 32..];
        assert_eq!(trailing, &[0xff; 32]);
    }
}
