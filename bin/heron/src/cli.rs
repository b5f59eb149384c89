//! Command-line interface of the node.

use clap::Parser;
use std::net::SocketAddr;
use url::Url;

/// The heron node CLI.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Virtual log-chain node over a UTXO source chain", long_about = None)]
pub struct Cli {
    /// Socket address the eth RPC server listens on.
    #[arg(long = "rpc.addr", env = "HERON_RPC_ADDR", default_value = "127.0.0.1:8545")]
    pub rpc_addr: SocketAddr,

    /// HTTP JSON-RPC endpoint of the source-chain node.
    #[arg(long = "node.endpoint", env = "HERON_NODE_ENDPOINT")]
    pub node_endpoint: Url,

    /// Basic-auth username for the source-chain node.
    #[arg(long = "node.username", env = "HERON_NODE_USERNAME", default_value = "")]
    pub node_username: String,

    /// Basic-auth password for the source-chain node.
    #[arg(long = "node.password", env = "HERON_NODE_PASSWORD", default_value = "")]
    pub node_password: String,

    /// Seconds to sleep between retries of a failed node call.
    #[arg(long = "node.retry-delay", env = "HERON_NODE_RETRY_DELAY", default_value_t = 10)]
    pub retry_delay: u64,

    /// Attempts per node call before the last error is surfaced.
    #[arg(long = "node.max-attempts", env = "HERON_NODE_MAX_ATTEMPTS", default_value_t = 999)]
    pub max_attempts: u32,

    /// Chain name block hashes are derived from. Instances meant to converge
    /// on the same virtual chain must agree on it.
    #[arg(long = "chain.name", env = "HERON_CHAIN_NAME", default_value = "heron")]
    pub chain_name: String,

    /// Seconds between block production rounds.
    #[arg(long = "chain.block-interval", env = "HERON_BLOCK_INTERVAL", default_value_t = 5)]
    pub block_interval: u64,

    /// Source-chain height scanning starts from on a fresh store.
    #[arg(long = "chain.genesis-height", env = "HERON_GENESIS_HEIGHT", default_value_t = 0)]
    pub genesis_scan_height: u64,

    /// Cap on transactions collected per production round.
    #[arg(long = "chain.max-txs", env = "HERON_MAX_TXS", default_value_t = 2000)]
    pub max_txs_per_block: usize,

    /// Log filter directives, `RUST_LOG` syntax.
    #[arg(long = "log.filter", env = "HERON_LOG_FILTER", default_value = "info")]
    pub log_filter: String,
}
