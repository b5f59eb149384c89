//! In-memory [`ChainClient`] double for tests.

use crate::{
    ChainClient, ClientError, ClientResult, RawTransaction, TxOut, VerboseBlock,
    WalletTransaction,
};
use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

/// An in-memory source chain: a mempool, a run of blocks and a transaction
/// index, with scriptable failures. Shares the [`ChainClient`] contract with
/// the HTTP adapter.
#[derive(Debug, Default)]
pub struct MockChainClient {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    mempool: Vec<String>,
    txs: HashMap<String, RawTransaction>,
    blocks: Vec<VerboseBlock>,
    unreachable: HashSet<String>,
    reject_reason: Option<String>,
    sent: Vec<Vec<u8>>,
}

impl MockChainClient {
    /// Registers a transaction so lookups resolve it, without placing it in
    /// the mempool or a block. Used for input-origin resolution.
    pub fn insert_tx(&self, tx: RawTransaction) {
        let mut state = self.state.lock().unwrap();
        state.txs.insert(tx.txid.clone(), tx);
    }

    /// Places a transaction in the mempool (and the index).
    pub fn push_mempool_tx(&self, tx: RawTransaction) {
        let mut state = self.state.lock().unwrap();
        state.mempool.push(tx.txid.clone());
        state.txs.insert(tx.txid.clone(), tx);
    }

    /// Appends a block at the given height containing the given
    /// transactions; the transactions also become resolvable by id.
    pub fn push_block(&self, height: u64, txs: Vec<RawTransaction>) {
        let mut state = self.state.lock().unwrap();
        for tx in &txs {
            state.txs.insert(tx.txid.clone(), tx.clone());
        }
        state.blocks.push(VerboseBlock { hash: format!("blockhash-{height}"), height, tx: txs });
    }

    /// Makes every lookup of the given txid fail with a transport-style
    /// error.
    pub fn make_unreachable(&self, txid: &str) {
        self.state.lock().unwrap().unreachable.insert(txid.to_string());
    }

    /// Makes `test_mempool_accept` reject with the given reason.
    pub fn reject_with(&self, reason: &str) {
        self.state.lock().unwrap().reject_reason = Some(reason.to_string());
    }

    /// Raw transactions submitted through `send_raw_transaction`.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().sent.clone()
    }

    fn not_found() -> ClientError {
        ClientError::Rpc { code: -5, message: "No such mempool or blockchain transaction".into() }
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn raw_mempool(&self) -> ClientResult<Vec<String>> {
        Ok(self.state.lock().unwrap().mempool.clone())
    }

    async fn raw_transaction_verbose(&self, txid: &str) -> ClientResult<RawTransaction> {
        let state = self.state.lock().unwrap();
        if state.unreachable.contains(txid) {
            return Err(ClientError::Rpc { code: -32603, message: "node unreachable".into() });
        }
        state.txs.get(txid).cloned().ok_or_else(Self::not_found)
    }

    async fn wallet_transaction(&self, txid: &str) -> ClientResult<WalletTransaction> {
        let state = self.state.lock().unwrap();
        let tx = state.txs.get(txid).ok_or_else(Self::not_found)?;
        Ok(WalletTransaction {
            txid: tx.txid.clone(),
            confirmations: tx.confirmations.unwrap_or(0) as i64,
            hex: String::new(),
        })
    }

    async fn block_count(&self) -> ClientResult<u64> {
        Ok(self.state.lock().unwrap().blocks.iter().map(|b| b.height).max().unwrap_or(0))
    }

    async fn block_hash(&self, height: u64) -> ClientResult<String> {
        let state = self.state.lock().unwrap();
        state
            .blocks
            .iter()
            .find(|b| b.height == height)
            .map(|b| b.hash.clone())
            .ok_or(ClientError::Rpc { code: -8, message: "Block height out of range".into() })
    }

    async fn block_with_txs(&self, hash: &str) -> ClientResult<VerboseBlock> {
        let state = self.state.lock().unwrap();
        state
            .blocks
            .iter()
            .find(|b| b.hash == hash)
            .cloned()
            .ok_or(ClientError::Rpc { code: -5, message: "Block not found".into() })
    }

    async fn test_mempool_accept(&self, _raw_tx: &[u8]) -> ClientResult<()> {
        let state = self.state.lock().unwrap();
        match &state.reject_reason {
            Some(reason) => Err(ClientError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }

    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> ClientResult<String> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(raw_tx.to_vec());
        Ok(format!("sent-{}", state.sent.len()))
    }

    async fn tx_out(
        &self,
        txid: &str,
        vout: u32,
        _include_mempool: bool,
    ) -> ClientResult<Option<TxOut>> {
        let state = self.state.lock().unwrap();
        let Some(tx) = state.txs.get(txid) else { return Ok(None) };
        Ok(tx.vout.get(vout as usize).map(|out| TxOut {
            confirmations: tx.confirmations.unwrap_or(0) as i64,
            value: out.value,
            script_pub_key: out.script_pub_key.clone(),
        }))
    }
}
