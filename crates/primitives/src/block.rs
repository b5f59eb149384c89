//! Virtual-chain block and transaction types.

use crate::EgtxLog;
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// A block on the virtual chain.
///
/// Block identity is deliberately independent of transaction content: the
/// hash is derived from the chain name and the previous height only, so
/// independently operated instances scanning the same source chain converge
/// on identical block hashes without agreeing on clock time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualBlock {
    /// Block height. Strictly increases by one per produced block.
    pub number: u64,
    /// Content hash of `"{chain_name}:{previous_height}"`.
    pub hash: B256,
    /// Hash of the previous head.
    pub parent_hash: B256,
    /// Wall-clock production time in unix seconds. Excluded from block
    /// identity; instances need not agree on it.
    pub produced_at: u64,
    /// The scanner's source-chain cursor after this block's round. Persisted
    /// here so a restarted instance can resume scanning where it left off.
    pub scan_cursor: u64,
    /// Hashes of the transactions included in this block, in order.
    pub tx_hashes: Vec<B256>,
}

/// A virtual transaction republishing one tagged source-chain transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualTransaction {
    /// The source-chain transaction id.
    pub hash: B256,
    /// Script hash of the first recognized input address, zero if absent.
    pub from: Address,
    /// Script hash of the first recognized output address, zero if absent.
    pub to: Address,
    /// Height of the enclosing virtual block.
    pub block_number: u64,
    /// Hash of the enclosing virtual block.
    pub block_hash: B256,
    /// Position within the enclosing block.
    pub tx_index: u64,
    /// The single synthetic log carrying the decoded payload.
    pub log: EgtxLog,
}

/// Head-of-chain recovery info read back from the store at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatestBlockInfo {
    /// Height of the latest stored block, zero for an empty store.
    pub height: u64,
    /// Wall-clock production time of the latest stored block.
    pub produced_at: u64,
    /// Hash of the latest stored block.
    pub hash: B256,
    /// Source-chain scan cursor persisted with the latest stored block.
    pub scan_cursor: u64,
}

/// Derives a chain id word from a chain name: the name's bytes left-aligned
/// in 32 bytes, truncated if longer.
pub fn chain_id_from_name(name: &str) -> B256 {
    let mut id = [0u8; 32];
    let bytes = name.as_bytes();
    let n = bytes.len().min(32);
    id[..n].copy_from_slice(&bytes[..n]);
    B256::new(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn chain_id_is_left_aligned_name() {
        let id = chain_id_from_name("virtual Bitcoin Cash");
        assert_eq!(&id[..20], b"virtual Bitcoin Cash");
        assert_eq!(&id[20..], &[0u8; 12]);
    }

    #[test]
    fn chain_id_truncates_long_names() {
        let name = "x".repeat(40);
        let id = chain_id_from_name(&name);
        assert_eq!(id.as_slice(), &[b'x'; 32]);
    }

    #[test]
    fn block_serde_round_trip() {
        let blk = VirtualBlock {
            number: 7,
            hash: b256!("1111111111111111111111111111111111111111111111111111111111111111"),
            parent_hash: B256::ZERO,
            produced_at: 1_700_000_000,
            scan_cursor: 800_123,
            tx_hashes: vec![B256::ZERO],
        };
        let json = serde_json::to_string(&blk).unwrap();
        assert_eq!(serde_json::from_str::<VirtualBlock>(&json).unwrap(), blk);
    }
}
