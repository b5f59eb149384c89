//! The synthetic log type and the positional match predicate.

use alloy_primitives::{Address, B256, Bytes};
use serde::{Deserialize, Serialize};

/// The synthetic log attached to a virtual transaction.
///
/// Carries the contract address and topics decoded from the tagged null-data
/// output and the packed payload blob produced by [`crate::LogPayload`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EgtxLog {
    /// Contract address from the first pushed element of the tagged script.
    pub address: Address,
    /// Zero to four topics. An empty push in a topic slot means the topic is
    /// absent, not zero.
    pub topics: Vec<B256>,
    /// The packed log payload. Its trailing 32 bytes are rewritten with a
    /// live confirmation figure at retrieval time.
    pub data: Bytes,
    /// Height of the enclosing virtual block.
    pub block_number: u64,
    /// Hash of the enclosing virtual block.
    pub block_hash: B256,
    /// Hash of the enclosing virtual transaction.
    #[serde(rename = "transactionHash")]
    pub tx_hash: B256,
    /// Index of the enclosing transaction within its block.
    #[serde(rename = "transactionIndex")]
    pub tx_index: u64,
}

impl EgtxLog {
    /// Overwrites the trailing 32 bytes of the log data with a live
    /// confirmation figure: all-ones for a transaction that disappeared from
    /// the source chain (presumed double-spent), otherwise the zero-padded
    /// big-endian depth. Logs with less than 32 bytes of data are left
    /// untouched.
    pub fn stamp_confirmations(&mut self, depth: i64) {
        if self.data.len() < 32 {
            return;
        }
        let mut word = [0u8; 32];
        if depth < 0 {
            word = [0xff; 32];
        } else {
            word[24..].copy_from_slice(&(depth as u64).to_be_bytes());
        }
        let mut data = self.data.to_vec();
        let at = data.len() - 32;
        data[at..].copy_from_slice(&word);
        self.data = data.into();
    }
}

/// Standard positional log filtering: a log matches iff its address is in
/// the (possibly empty) address list, and for every topic position below
/// both lengths the filter's set at that position is empty or contains the
/// log's topic. OR within a position, AND across positions.
pub fn matches_log(
    address: &Address,
    topics: &[B256],
    addr_filter: &[Address],
    topic_filter: &[Vec<B256>],
) -> bool {
    if !addr_filter.is_empty() && !addr_filter.contains(address) {
        return false;
    }
    topic_filter
        .iter()
        .zip(topics.iter())
        .all(|(wanted, topic)| wanted.is_empty() || wanted.contains(topic))
}
