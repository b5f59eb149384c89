//! The source-chain capability trait.

use crate::{
    ClientResult, RawTransaction, TxOut, VerboseBlock, WalletTransaction,
};
use async_trait::async_trait;
use std::fmt::Debug;

/// Capability surface of the source-chain node.
///
/// Every implementation is expected to apply the same retry policy to every
/// call: the production adapter retries with a fixed delay up to a fixed
/// attempt count and surfaces the last error on exhaustion.
#[async_trait]
pub trait ChainClient: Debug + Send + Sync {
    /// Lists the transaction ids currently in the node's mempool.
    async fn raw_mempool(&self) -> ClientResult<Vec<String>>;

    /// Fetches a transaction in verbose form.
    async fn raw_transaction_verbose(&self, txid: &str) -> ClientResult<RawTransaction>;

    /// Fetches a transaction through the node's wallet view.
    async fn wallet_transaction(&self, txid: &str) -> ClientResult<WalletTransaction>;

    /// The current chain tip height.
    async fn block_count(&self) -> ClientResult<u64>;

    /// The block hash at the given height.
    async fn block_hash(&self, height: u64) -> ClientResult<String>;

    /// Fetches a block with fully decoded transactions.
    async fn block_with_txs(&self, hash: &str) -> ClientResult<VerboseBlock>;

    /// Tests whether the node would admit the raw transaction to its
    /// mempool. A rejection surfaces as [`crate::ClientError::Rejected`]
    /// carrying the node's reject reason.
    async fn test_mempool_accept(&self, raw_tx: &[u8]) -> ClientResult<()>;

    /// Submits a raw transaction, returning its txid.
    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> ClientResult<String>;

    /// Looks up an unspent output. `None` when the output is spent or
    /// unknown.
    async fn tx_out(
        &self,
        txid: &str,
        vout: u32,
        include_mempool: bool,
    ) -> ClientResult<Option<TxOut>>;
}
