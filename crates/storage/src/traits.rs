//! The [`LogStore`] contract.

use crate::StoreError;
use alloy_primitives::{Address, B256};
use heron_primitives::{EgtxLog, LatestBlockInfo, VirtualBlock, VirtualTransaction};
use std::fmt::Debug;

/// Predicate deciding whether a log's address and topics match a filter's
/// address list and list-of-topic-lists. Passed into [`LogStore::query_logs`]
/// so the matching contract lives with the caller, not the engine.
pub type MatchPredicate<'a> = &'a (dyn Fn(&Address, &[B256]) -> bool + Send + Sync);

/// The persistent indexed block/transaction/log store.
///
/// Implementations must be thread-safe; the production engine is an external
/// collaborator consumed through this trait only.
pub trait LogStore: Debug + Send + Sync {
    /// Persists a produced block together with its transactions.
    fn add_block(
        &self,
        block: &VirtualBlock,
        txs: &[VirtualTransaction],
    ) -> Result<(), StoreError>;

    /// The block at the given height, if any.
    fn block_by_height(&self, height: u64) -> Result<Option<VirtualBlock>, StoreError>;

    /// The block with the given hash, if any.
    fn block_by_hash(&self, hash: &B256) -> Result<Option<VirtualBlock>, StoreError>;

    /// The transaction with the given hash, if any.
    fn tx_by_hash(&self, hash: &B256) -> Result<Option<VirtualTransaction>, StoreError>;

    /// The transactions of the block at `height`, positions `start..end`
    /// clamped to the block's length.
    fn txs_by_height(
        &self,
        height: u64,
        start: usize,
        end: usize,
    ) -> Result<Vec<VirtualTransaction>, StoreError>;

    /// Indexed log query over the inclusive height range `from..=to`,
    /// returning the logs for which `predicate` holds. Exceeding the
    /// store's result cap is [`StoreError::TooManyResults`].
    fn query_logs(
        &self,
        addresses: &[Address],
        topics: &[Vec<B256>],
        from: u64,
        to: u64,
        predicate: MatchPredicate<'_>,
    ) -> Result<Vec<EgtxLog>, StoreError>;

    /// Whether a transaction with the given hash is already part of a
    /// stored block.
    fn is_tx_mined(&self, hash: &B256) -> bool;

    /// Head-of-chain recovery info. An empty store reports height zero, the
    /// current wall-clock time, a zero hash and a zero cursor.
    fn latest_block_info(&self) -> Result<LatestBlockInfo, StoreError>;

    /// Releases the store's resources.
    fn close(&self);
}
