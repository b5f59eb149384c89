//! In-memory [`LogStore`] implementation.

use crate::{LogStore, MatchPredicate, StoreError};
use alloy_primitives::{Address, B256};
use heron_primitives::{EgtxLog, LatestBlockInfo, VirtualBlock, VirtualTransaction};
use std::{
    collections::{BTreeMap, HashMap},
    sync::RwLock,
    time::{SystemTime, UNIX_EPOCH},
};

/// RwLock-guarded maps implementing the full [`LogStore`] contract. Serves
/// as the test double and the default runtime store; durability is the
/// external engine's concern.
#[derive(Debug)]
pub struct MemoryStore {
    max_results: usize,
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    blocks_by_height: BTreeMap<u64, VirtualBlock>,
    height_by_hash: HashMap<B256, u64>,
    txs_by_hash: HashMap<B256, VirtualTransaction>,
    tx_hashes_by_height: BTreeMap<u64, Vec<B256>>,
}

/// Default cap on indexed query results.
pub(crate) const DEFAULT_MAX_RESULTS: usize = 2000;

impl MemoryStore {
    /// Creates a store with the given result cap.
    pub fn new(max_results: usize) -> Self {
        Self { max_results, inner: RwLock::new(Inner::default()) }
    }

    fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS)
    }
}

impl LogStore for MemoryStore {
    fn add_block(
        &self,
        block: &VirtualBlock,
        txs: &[VirtualTransaction],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.blocks_by_height.insert(block.number, block.clone());
        inner.height_by_hash.insert(block.hash, block.number);
        let hashes = txs.iter().map(|tx| tx.hash).collect();
        inner.tx_hashes_by_height.insert(block.number, hashes);
        for tx in txs {
            inner.txs_by_hash.insert(tx.hash, tx.clone());
        }
        Ok(())
    }

    fn block_by_height(&self, height: u64) -> Result<Option<VirtualBlock>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(inner.blocks_by_height.get(&height).cloned())
    }

    fn block_by_hash(&self, hash: &B256) -> Result<Option<VirtualBlock>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .height_by_hash
            .get(hash)
            .and_then(|height| inner.blocks_by_height.get(height))
            .cloned())
    }

    fn tx_by_hash(&self, hash: &B256) -> Result<Option<VirtualTransaction>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(inner.txs_by_hash.get(hash).cloned())
    }

    fn txs_by_height(
        &self,
        height: u64,
        start: usize,
        end: usize,
    ) -> Result<Vec<VirtualTransaction>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let Some(hashes) = inner.tx_hashes_by_height.get(&height) else { return Ok(Vec::new()) };
        let start = start.min(hashes.len());
        let end = end.min(hashes.len()).max(start);
        hashes[start..end]
            .iter()
            .map(|hash| {
                inner
                    .txs_by_hash
                    .get(hash)
                    .cloned()
                    .ok_or_else(|| StoreError::Corrupt(format!("missing tx {hash}")))
            })
            .collect()
    }

    fn query_logs(
        &self,
        _addresses: &[Address],
        _topics: &[Vec<B256>],
        from: u64,
        to: u64,
        predicate: MatchPredicate<'_>,
    ) -> Result<Vec<EgtxLog>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut logs = Vec::new();
        for (_, hashes) in inner.tx_hashes_by_height.range(from..=to) {
            for hash in hashes {
                let tx = inner
                    .txs_by_hash
                    .get(hash)
                    .ok_or_else(|| StoreError::Corrupt(format!("missing tx {hash}")))?;
                let log = &tx.log;
                if predicate(&log.address, &log.topics) {
                    if logs.len() >= self.max_results {
                        return Err(StoreError::TooManyResults);
                    }
                    logs.push(log.clone());
                }
            }
        }
        Ok(logs)
    }

    fn is_tx_mined(&self, hash: &B256) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.txs_by_hash.contains_key(hash)
    }

    fn latest_block_info(&self) -> Result<LatestBlockInfo, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let Some((_, block)) = inner.blocks_by_height.last_key_value() else {
            return Ok(LatestBlockInfo {
                height: 0,
                produced_at: Self::now(),
                hash: B256::ZERO,
                scan_cursor: 0,
            });
        };
        Ok(LatestBlockInfo {
            height: block.number,
            produced_at: block.produced_at,
            hash: block.hash,
            scan_cursor: block.scan_cursor,
        })
    }

    fn close(&self) {}
}
