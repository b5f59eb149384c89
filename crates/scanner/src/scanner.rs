//! The per-round transaction collection loop.

use crate::{ConvertError, KnownTxCache, ScannerError, convert_tagged_tx};
use alloy_primitives::B256;
use heron_client::ChainClient;
use heron_primitives::VirtualTransaction;
use heron_storage::LogStore;
use std::sync::Arc;
use tracing::{debug, trace};

/// Capacity of the known-transaction cache.
pub const KNOWN_TX_CACHE_SIZE: usize = 100_000;

/// Collects tagged transactions for the block producer, one round at a time.
///
/// A round optionally walks source blocks from the persisted cursor to the
/// source tip and then sweeps the mempool, converting each new candidate.
/// Mined-into-source candidates that fail conversion are retried on later
/// rounds; mempool candidates that fail conversion are remembered so the
/// mempool sweep does not reprocess them.
#[derive(Debug)]
pub struct Scanner<C, S> {
    client: Arc<C>,
    store: Arc<S>,
    max_txs_per_round: usize,
    cursor: u64,
    known: KnownTxCache,
}

impl<C: ChainClient, S: LogStore> Scanner<C, S> {
    /// Creates a scanner collecting at most `max_txs_per_round` transactions
    /// per round. The cursor starts at zero; the block producer sets it from
    /// the recovered head before the first round.
    pub fn new(client: Arc<C>, store: Arc<S>, max_txs_per_round: usize) -> Self {
        Self {
            client,
            store,
            max_txs_per_round,
            cursor: 0,
            known: KnownTxCache::new(KNOWN_TX_CACHE_SIZE),
        }
    }

    /// The source-chain height up to which blocks have been scanned.
    pub const fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Moves the scan cursor, typically to a recovered persisted position.
    pub fn set_cursor(&mut self, cursor: u64) {
        self.cursor = cursor;
    }

    /// Runs one collection round for the virtual block at `next_height` with
    /// hash `next_hash`. When `scan_blocks` is set, source blocks past the
    /// cursor are walked before the mempool sweep and the cursor advances
    /// per fully scanned block.
    pub async fn collect_new_txs(
        &mut self,
        next_height: u64,
        next_hash: B256,
        scan_blocks: bool,
    ) -> Result<Vec<VirtualTransaction>, ScannerError> {
        let mut txs = Vec::new();
        let mut tx_index = 0u64;

        if scan_blocks {
            self.collect_block_txs(next_height, next_hash, &mut tx_index, &mut txs).await?;
            if txs.len() >= self.max_txs_per_round {
                return Ok(txs);
            }
        }

        let mempool = self.client.raw_mempool().await?;
        trace!(target: "scanner", candidates = mempool.len(), "sweeping mempool");
        for txid in mempool {
            if self.known.contains(&txid) || self.is_mined(&txid) {
                continue;
            }
            let tx = match self.client.raw_transaction_verbose(&txid).await {
                Ok(tx) => tx,
                Err(err) => {
                    // Fetch failures are transient; leave the id uncached so
                    // the next sweep retries it.
                    debug!(target: "scanner", %err, txid, "failed to fetch mempool transaction");
                    continue;
                }
            };
            match convert_tagged_tx(self.client.as_ref(), &tx, tx_index, next_height, next_hash)
                .await
            {
                Ok(vtx) => {
                    txs.push(vtx);
                    tx_index += 1;
                    self.known.insert(&txid);
                }
                Err(ConvertError::Client(err)) => return Err(err.into()),
                Err(err) => {
                    // Structurally unusable; remember it so the sweep stops
                    // refetching it every round.
                    trace!(target: "scanner", %err, txid, "ignoring mempool transaction");
                    self.known.insert(&txid);
                }
            }
            if txs.len() >= self.max_txs_per_round {
                break;
            }
        }
        Ok(txs)
    }

    /// Walks source blocks from the cursor to the source tip, converting
    /// every new tagged transaction found.
    async fn collect_block_txs(
        &mut self,
        next_height: u64,
        next_hash: B256,
        tx_index: &mut u64,
        txs: &mut Vec<VirtualTransaction>,
    ) -> Result<(), ScannerError> {
        let tip = self.client.block_count().await?;
        for height in self.cursor + 1..=tip {
            let hash = self.client.block_hash(height).await?;
            let block = self.client.block_with_txs(&hash).await?;
            debug!(target: "scanner", height, candidates = block.tx.len(), "scanning source block");
            for tx in &block.tx {
                if self.known.contains(&tx.txid) || self.is_mined(&tx.txid) {
                    continue;
                }
                match convert_tagged_tx(
                    self.client.as_ref(),
                    tx,
                    *tx_index,
                    next_height,
                    next_hash,
                )
                .await
                {
                    Ok(vtx) => {
                        txs.push(vtx);
                        *tx_index += 1;
                    }
                    Err(ConvertError::Client(err)) => return Err(err.into()),
                    // Not cached: a mined transaction whose conversion fails
                    // today may succeed once its dependencies resolve.
                    Err(err) => {
                        trace!(target: "scanner", %err, txid = tx.txid, "ignoring block transaction")
                    }
                }
            }
            self.cursor = height;
            if txs.len() >= self.max_txs_per_round {
                break;
            }
        }
        Ok(())
    }

    fn is_mined(&self, txid: &str) -> bool {
        txid.parse::<B256>().is_ok_and(|hash| self.store.is_tx_mined(&hash))
    }
}

/// Live confirmation depth of a source-chain transaction: its reported depth
/// when found (zero while still in the mempool), `-1` when the node no
/// longer knows it.
pub async fn confirmations<C: ChainClient>(client: &C, txid: &str) -> i64 {
    match client.raw_transaction_verbose(txid).await {
        Ok(tx) => tx.confirmations.unwrap_or(0) as i64,
        Err(err) => {
            debug!(target: "scanner", %err, txid, "transaction not found, reporting -1");
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;
    use heron_client::{
        MockChainClient, RawTransaction, ScriptKind, ScriptPubKey, TxInput, TxOutput,
    };
    use heron_primitives::TAGGED_PREFIX;
    use heron_storage::MemoryStore;

    const PAYER: [u8; 20] = [0x11; 20];
    const PAYEE: [u8; 20] = [0x22; 20];

    fn p2pkh(hash: [u8; 20]) -> ScriptPubKey {
        ScriptPubKey {
            kind: ScriptKind::PubkeyHash,
            hex: format!("76a914{}88ac", hex::encode(hash)),
            addresses: vec![],
        }
    }

    fn tagged_script() -> ScriptPubKey {
        let mut script = TAGGED_PREFIX.to_vec();
        script.push(0x14);
        script.extend_from_slice(&[0xca; 20]);
        ScriptPubKey { kind: ScriptKind::NullData, hex: hex::encode(script), addresses: vec![] }
    }

    fn origin_txid() -> String {
        "aa".repeat(32)
    }

    fn tagged_tx(txid: &str) -> RawTransaction {
        RawTransaction {
            txid: txid.into(),
            vin: vec![TxInput { txid: Some(origin_txid()), vout: Some(0) }],
            vout: vec![
                TxOutput {
                    value: 0.0,
                    n: 0,
                    script_pub_key: tagged_script(),
                    token_data: None,
                },
                TxOutput { value: 1.0, n: 1, script_pub_key: p2pkh(PAYEE), token_data: None },
            ],
            ..Default::default()
        }
    }

    fn untagged_tx(txid: &str) -> RawTransaction {
        RawTransaction {
            txid: txid.into(),
            vout: vec![TxOutput { value: 1.0, n: 0, script_pub_key: p2pkh(PAYER), token_data: None }],
            ..Default::default()
        }
    }

    fn client_with_origin() -> MockChainClient {
        let client = MockChainClient::default();
        client.insert_tx(RawTransaction {
            txid: origin_txid(),
            vout: vec![TxOutput { value: 1.0, n: 0, script_pub_key: p2pkh(PAYER), token_data: None }],
            ..Default::default()
        });
        client
    }

    fn scanner(client: MockChainClient) -> Scanner<MockChainClient, MemoryStore> {
        Scanner::new(Arc::new(client), Arc::new(MemoryStore::default()), 2000)
    }

    #[tokio::test]
    async fn collects_from_mempool_and_caches_ids() {
        let client = client_with_origin();
        client.push_mempool_tx(tagged_tx(&"bb".repeat(32)));
        let mut scanner = scanner(client);

        let txs = scanner.collect_new_txs(1, B256::repeat_byte(1), false).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].block_number, 1);
        assert!(scanner.known.contains(&"bb".repeat(32)));

        // The same mempool entry is not converted twice.
        let txs = scanner.collect_new_txs(1, B256::repeat_byte(1), false).await.unwrap();
        assert!(txs.is_empty());
    }

    #[tokio::test]
    async fn untagged_mempool_txs_are_cached_once() {
        let client = client_with_origin();
        client.push_mempool_tx(untagged_tx(&"cc".repeat(32)));
        let mut scanner = scanner(client);

        let txs = scanner.collect_new_txs(1, B256::ZERO, false).await.unwrap();
        assert!(txs.is_empty());
        assert!(scanner.known.contains(&"cc".repeat(32)));
    }

    #[tokio::test]
    async fn unreachable_mempool_tx_is_skipped_without_caching() {
        let client = client_with_origin();
        client.push_mempool_tx(tagged_tx(&"bb".repeat(32)));
        client.make_unreachable(&"bb".repeat(32));
        let mut scanner = scanner(client);

        let txs = scanner.collect_new_txs(1, B256::ZERO, false).await.unwrap();
        assert!(txs.is_empty());
        assert!(scanner.known.is_empty());
    }

    #[tokio::test]
    async fn block_walk_advances_cursor_and_skips_failures_uncached() {
        let client = client_with_origin();
        client.push_block(5, vec![tagged_tx(&"bb".repeat(32)), untagged_tx(&"cc".repeat(32))]);
        let mut scanner = scanner(client);
        scanner.set_cursor(4);

        let txs = scanner.collect_new_txs(1, B256::ZERO, true).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(scanner.cursor(), 5);
        // Failed block transactions stay retryable: not cached.
        assert!(!scanner.known.contains(&"cc".repeat(32)));
        // Converted block transactions are not cached either; dedup against
        // later rounds goes through the store.
        assert!(!scanner.known.contains(&"bb".repeat(32)));
    }

    #[tokio::test]
    async fn already_mined_txs_are_skipped() {
        let client = client_with_origin();
        client.push_mempool_tx(tagged_tx(&"bb".repeat(32)));
        let store = Arc::new(MemoryStore::default());
        let mut scanner = Scanner::new(Arc::new(client), store.clone(), 2000);

        let txs = scanner.collect_new_txs(1, B256::repeat_byte(1), false).await.unwrap();
        assert_eq!(txs.len(), 1);

        // Pretend the producer mined the round into a block.
        let block = heron_primitives::VirtualBlock {
            number: 1,
            hash: B256::repeat_byte(1),
            tx_hashes: vec![txs[0].hash],
            ..Default::default()
        };
        store.add_block(&block, &txs).unwrap();

        let mut fresh =
            Scanner::new(scanner.client.clone(), store.clone(), 2000);
        let txs = fresh.collect_new_txs(2, B256::repeat_byte(2), false).await.unwrap();
        assert!(txs.is_empty());
    }

    #[tokio::test]
    async fn respects_the_per_round_cap() {
        let client = client_with_origin();
        for i in 0..5 {
            client.push_mempool_tx(tagged_tx(&format!("{i:02x}").repeat(32)));
        }
        let mut scanner =
            Scanner::new(Arc::new(client), Arc::new(MemoryStore::default()), 3);

        let txs = scanner.collect_new_txs(1, B256::ZERO, false).await.unwrap();
        assert_eq!(txs.len(), 3);
        // The uncollected remainder is picked up next round.
        let txs = scanner.collect_new_txs(1, B256::ZERO, false).await.unwrap();
        assert_eq!(txs.len(), 2);
    }

    #[tokio::test]
    async fn tx_indexes_are_sequential_across_sources() {
        let client = client_with_origin();
        client.push_block(1, vec![tagged_tx(&"bb".repeat(32))]);
        client.push_mempool_tx(tagged_tx(&"cc".repeat(32)));
        let mut scanner = scanner(client);

        let txs = scanner.collect_new_txs(1, B256::ZERO, true).await.unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].tx_index, 0);
        assert_eq!(txs[1].tx_index, 1);
    }

    #[tokio::test]
    async fn confirmation_depth_reporting() {
        let client = client_with_origin();
        let mut confirmed = tagged_tx(&"bb".repeat(32));
        confirmed.confirmations = Some(7);
        client.insert_tx(confirmed);
        let mut pending = tagged_tx(&"cc".repeat(32));
        pending.confirmations = None;
        client.insert_tx(pending);

        assert_eq!(confirmations(&client, &"bb".repeat(32)).await, 7);
        assert_eq!(confirmations(&client, &"cc".repeat(32)).await, 0);
        assert_eq!(confirmations(&client, &"ee".repeat(32)).await, -1);
    }
}
