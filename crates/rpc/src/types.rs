//! Wire types of the filter API.

use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, B256};
use heron_primitives::EgtxLog;
use serde::{Deserialize, Serialize};

/// A log filter as submitted to `eth_newFilter` or `eth_getLogs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    /// Start of the block range; defaults to the latest block.
    pub from_block: Option<BlockNumberOrTag>,
    /// End of the block range; defaults to the latest block.
    pub to_block: Option<BlockNumberOrTag>,
    /// Restricts the query to a single block. Mutually exclusive with the
    /// range fields; takes precedence when set.
    pub block_hash: Option<B256>,
    /// Contract address or list of addresses; empty matches every address.
    pub address: AddressFilter,
    /// Positional topic sets: OR within a position, AND across positions,
    /// an empty set leaves the position unconstrained.
    pub topics: Vec<Vec<B256>>,
}

/// The `address` field of a filter: a single address or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressFilter {
    /// One address.
    Single(Address),
    /// Zero or more addresses; empty matches everything.
    Many(Vec<Address>),
}

impl AddressFilter {
    /// The filter as a slice of addresses.
    pub fn as_slice(&self) -> &[Address] {
        match self {
            Self::Single(addr) => std::slice::from_ref(addr),
            Self::Many(addrs) => addrs,
        }
    }
}

impl Default for AddressFilter {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// Result of `eth_getFilterChanges`: block hashes for a block filter, logs
/// for a log filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterChanges {
    /// Hashes of blocks produced since the last poll.
    Hashes(Vec<B256>),
    /// Logs matched since the last poll.
    Logs(Vec<EgtxLog>),
}

/// The stream kinds accepted by `eth_subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubscriptionKind {
    /// One event per produced block head.
    NewHeads,
    /// One event per matching log.
    Logs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn criteria_accepts_single_or_many_addresses() {
        let single: FilterCriteria = serde_json::from_str(
            r#"{"address": "0x00000000000000000000000000000000000000aa"}"#,
        )
        .unwrap();
        assert_eq!(
            single.address.as_slice(),
            &[address!("00000000000000000000000000000000000000aa")]
        );

        let many: FilterCriteria = serde_json::from_str(
            r#"{"address": ["0x00000000000000000000000000000000000000aa",
                            "0x00000000000000000000000000000000000000bb"]}"#,
        )
        .unwrap();
        assert_eq!(many.address.as_slice().len(), 2);
    }

    #[test]
    fn criteria_defaults_are_empty() {
        let criteria: FilterCriteria = serde_json::from_str("{}").unwrap();
        assert_eq!(criteria, FilterCriteria::default());
        assert!(criteria.address.as_slice().is_empty());
        assert!(criteria.topics.is_empty());
        assert!(criteria.block_hash.is_none());
    }

    #[test]
    fn criteria_parses_range_tags_and_numbers() {
        let criteria: FilterCriteria =
            serde_json::from_str(r#"{"fromBlock": "0x10", "toBlock": "latest"}"#).unwrap();
        assert_eq!(criteria.from_block, Some(BlockNumberOrTag::Number(0x10)));
        assert_eq!(criteria.to_block, Some(BlockNumberOrTag::Latest));
    }

    #[test]
    fn filter_changes_serializes_flat() {
        let hashes = FilterChanges::Hashes(vec![B256::repeat_byte(1)]);
        let json = serde_json::to_string(&hashes).unwrap();
        assert!(json.starts_with("[\"0x01"));

        let logs = FilterChanges::Logs(vec![EgtxLog::default()]);
        let json = serde_json::to_string(&logs).unwrap();
        assert!(json.contains("\"transactionHash\""));
    }

    #[test]
    fn subscription_kind_strings() {
        assert_eq!(
            serde_json::from_str::<SubscriptionKind>("\"newHeads\"").unwrap(),
            SubscriptionKind::NewHeads
        );
        assert_eq!(
            serde_json::from_str::<SubscriptionKind>("\"logs\"").unwrap(),
            SubscriptionKind::Logs
        );
    }
}
