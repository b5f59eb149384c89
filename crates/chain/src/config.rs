//! Producer configuration and the block-identity hash.

use alloy_primitives::B256;
use heron_primitives::chain_id_from_name;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Configuration of a virtual chain instance.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// The chain name block hashes are derived from. Instances must agree on
    /// it to converge on the same chain.
    pub chain_name: String,
    /// Time between production rounds.
    pub block_interval: Duration,
    /// Source-chain height scanning starts from on a fresh store.
    pub genesis_scan_height: u64,
    /// Cap on transactions collected per production round.
    pub max_txs_per_block: usize,
}

impl ChainConfig {
    /// The chain id word derived from the chain name.
    pub fn chain_id(&self) -> B256 {
        chain_id_from_name(&self.chain_name)
    }
}

/// The hash of the block following a head at `prev_height`: the SHA-256 of
/// `"{chain_name}:{prev_height}"`. Deliberately independent of transaction
/// content and clock time.
pub fn block_hash(chain_name: &str, prev_height: u64) -> B256 {
    let digest = Sha256::digest(format!("{chain_name}:{prev_height}"));
    B256::from_slice(&digest)
}
