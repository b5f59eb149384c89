//! The heron node: scans a UTXO source chain for tagged transactions and
//! serves them as an EVM-style log chain.

use anyhow::{Context, Result};
use clap::Parser;
use heron_chain::{ChainConfig, EventScope, VirtualChain};
use heron_client::{HttpChainClient, HttpClientConfig};
use heron_rpc::{EthRpc, FilterBackend, FilterRegistry};
use heron_storage::{LogStore, MemoryStore};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_filter).context("invalid log filter")?)
        .init();

    let client_config = HttpClientConfig {
        retry_delay: Duration::from_secs(cli.retry_delay),
        max_attempts: cli.max_attempts,
        ..HttpClientConfig::new(cli.node_endpoint, cli.node_username, cli.node_password)
    };
    let client = Arc::new(HttpChainClient::new(client_config));
    let store = Arc::new(MemoryStore::default());
    let events = EventScope::default();

    let chain_config = ChainConfig {
        chain_name: cli.chain_name,
        block_interval: Duration::from_secs(cli.block_interval),
        genesis_scan_height: cli.genesis_scan_height,
        max_txs_per_block: cli.max_txs_per_block,
    };
    info!(
        target: "heron",
        chain = chain_config.chain_name,
        interval = cli.block_interval,
        "starting heron node"
    );

    let cancellation = CancellationToken::new();

    let registry = FilterRegistry::new(events.clone());
    registry.spawn_sweeper(cancellation.clone());
    let backend = FilterBackend::new(client.clone(), store.clone());
    let rpc = EthRpc::new(chain_config.chain_id(), backend, registry, events.clone());
    let server = rpc.launch(cli.rpc_addr).await.context("failed to start rpc server")?;

    let chain = VirtualChain::new(chain_config, client, store.clone(), events);
    let mut producer = tokio::spawn(chain.start(cancellation.clone()));

    let outcome = tokio::select! {
        result = &mut producer => result,
        _ = tokio::signal::ctrl_c() => {
            info!(target: "heron", "shutdown signal received");
            cancellation.cancel();
            producer.await
        }
    };
    server.stop().ok();
    // Closed only once both the producer and the server are done with it.
    store.close();
    outcome.context("block producer panicked")?.context("block producer failed")?;
    Ok(())
}
