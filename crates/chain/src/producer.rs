//! The block production loop.

use crate::{ChainConfig, ChainError, EventScope, block_hash};
use alloy_primitives::B256;
use heron_client::ChainClient;
use heron_primitives::VirtualBlock;
use heron_scanner::Scanner;
use heron_storage::LogStore;
use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Number of production rounds between forced source-block scans. Rounds in
/// between only sweep the mempool.
const FORCED_ROUND_CADENCE: u64 = 12;

/// The virtual chain's block producer.
///
/// Owns the scanner and drives it on a fixed interval, persisting and
/// publishing each produced block. Store and scanner failures end the loop;
/// the process supervisor decides whether to restart.
#[derive(Debug)]
pub struct VirtualChain<C, S> {
    config: ChainConfig,
    store: Arc<S>,
    scanner: Scanner<C, S>,
    events: EventScope,
    height: u64,
    head_hash: B256,
    produced_at: u64,
}

impl<C: ChainClient, S: LogStore> VirtualChain<C, S> {
    /// Creates a producer over the given client and store. Events fan out
    /// through `events`; subscribe before calling [`Self::start`].
    pub fn new(config: ChainConfig, client: Arc<C>, store: Arc<S>, events: EventScope) -> Self {
        let scanner = Scanner::new(client, store.clone(), config.max_txs_per_block);
        Self {
            config,
            store,
            scanner,
            events,
            height: 0,
            head_hash: B256::ZERO,
            produced_at: 0,
        }
    }

    /// Runs the production loop until `cancellation` fires or a fatal error
    /// occurs.
    ///
    /// After recovering the head, the first round is forced: it runs
    /// immediately when the instance was down for at least a block interval,
    /// otherwise once the interval since the recovered head elapses. Every
    /// [`FORCED_ROUND_CADENCE`]th round thereafter is forced again so
    /// source blocks keep being scanned even through a quiet mempool.
    pub async fn start(mut self, cancellation: CancellationToken) -> Result<(), ChainError> {
        self.recover()?;

        let interval = self.config.block_interval;
        let elapsed = unix_now().saturating_sub(self.produced_at);
        if elapsed < interval.as_secs() {
            let wait = interval - Duration::from_secs(elapsed);
            debug!(target: "virtual_chain", wait = ?wait, "waiting out the recovered head's interval");
            tokio::select! {
                _ = cancellation.cancelled() => return Ok(self.shutdown()),
                _ = tokio::time::sleep(wait) => {}
            }
        }
        self.produce(true).await?;

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // the immediate first tick
        let mut rounds = 0u64;
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => return Ok(self.shutdown()),
                _ = ticker.tick() => {
                    rounds += 1;
                    self.produce(rounds % FORCED_ROUND_CADENCE == 0).await?;
                }
            }
        }
    }

    /// Restores the head and scan cursor from the store. A fresh store
    /// starts at height zero with the configured genesis cursor.
    fn recover(&mut self) -> Result<(), ChainError> {
        let info = self.store.latest_block_info()?;
        self.height = info.height;
        self.head_hash = info.hash;
        self.produced_at = info.produced_at;
        let cursor =
            if info.height == 0 { self.config.genesis_scan_height } else { info.scan_cursor };
        self.scanner.set_cursor(cursor);
        info!(
            target: "virtual_chain",
            height = self.height,
            cursor,
            "recovered virtual chain head"
        );
        Ok(())
    }

    /// Runs one production round. A forced round scans source blocks and
    /// always produces a block; an opportunistic round produces one only
    /// when the mempool sweep found transactions.
    async fn produce(&mut self, forced: bool) -> Result<(), ChainError> {
        let next_height = self.height + 1;
        let next_hash = block_hash(&self.config.chain_name, self.height);
        let txs = self.scanner.collect_new_txs(next_height, next_hash, forced).await?;
        if !forced && txs.is_empty() {
            debug!(target: "virtual_chain", height = self.height, "empty round, keeping the head");
            return Ok(());
        }

        let block = VirtualBlock {
            number: next_height,
            hash: next_hash,
            parent_hash: self.head_hash,
            produced_at: unix_now(),
            scan_cursor: self.scanner.cursor(),
            tx_hashes: txs.iter().map(|tx| tx.hash).collect(),
        };
        self.store.add_block(&block, &txs)?;
        self.height = block.number;
        self.head_hash = block.hash;
        self.produced_at = block.produced_at;
        info!(
            target: "virtual_chain",
            height = block.number,
            txs = txs.len(),
            forced,
            "produced virtual block"
        );
        self.events.publish_block(&block, &txs);
        Ok(())
    }

    /// Logs the stop. The store stays open: other components share it, so
    /// closing it is the process supervisor's job once everything has
    /// stopped.
    fn shutdown(&self) {
        info!(target: "virtual_chain", height = self.height, "stopping block production");
    }
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
