//! Serde models for the source-chain node's verbose JSON-RPC responses.

use alloy_primitives::{Address, hex};
use serde::{Deserialize, Serialize};

/// A transaction in verbose form, as returned by `getrawtransaction` with
/// verbosity 1 or inside a verbosity-2 `getblock`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Transaction id in the node's display order.
    pub txid: String,
    /// Confirmation depth; absent for unconfirmed transactions.
    #[serde(default)]
    pub confirmations: Option<u64>,
    /// Transaction inputs.
    #[serde(default)]
    pub vin: Vec<TxInput>,
    /// Transaction outputs.
    #[serde(default)]
    pub vout: Vec<TxOutput>,
}

/// A transaction input reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxInput {
    /// Origin transaction id; absent for coinbase inputs.
    #[serde(default)]
    pub txid: Option<String>,
    /// Output index within the origin transaction.
    #[serde(default)]
    pub vout: Option<u32>,
}

/// A transaction output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Output value in whole coins.
    pub value: f64,
    /// Output index.
    pub n: u32,
    /// The locking script.
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
    /// Attached CashToken metadata, when present.
    #[serde(rename = "tokenData", default)]
    pub token_data: Option<TokenData>,
}

/// A locking script in verbose form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptPubKey {
    /// The script classification reported by the node.
    #[serde(rename = "type")]
    pub kind: ScriptKind,
    /// The raw script, hex encoded.
    pub hex: String,
    /// Decoded address strings, when the script pays to one.
    #[serde(default)]
    pub addresses: Vec<String>,
}

/// The node's script classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptKind {
    /// An unspendable data-carrier output.
    #[serde(rename = "nulldata")]
    NullData,
    /// Pay to public-key hash.
    #[serde(rename = "pubkeyhash")]
    PubkeyHash,
    /// Pay to script hash.
    #[serde(rename = "scripthash")]
    ScriptHash,
    /// Anything else.
    #[default]
    #[serde(other)]
    Other,
}

impl ScriptKind {
    /// Whether this is one of the two standard pay-to-address forms.
    pub const fn is_pay_to_address(self) -> bool {
        matches!(self, Self::PubkeyHash | Self::ScriptHash)
    }
}

impl ScriptPubKey {
    /// Extracts the 20-byte payload hash of a standard P2PKH
    /// (`76a914{20}88ac`) or P2SH (`a914{20}87`) script. This equals the
    /// payload of the decoded address without round-tripping through an
    /// address codec.
    pub fn script_hash(&self) -> Option<Address> {
        let bytes = hex::decode(&self.hex).ok()?;
        match bytes.as_slice() {
            [0x76, 0xa9, 0x14, hash @ .., 0x88, 0xac] if hash.len() == 20 => {
                Some(Address::from_slice(hash))
            }
            [0xa9, 0x14, hash @ .., 0x87] if hash.len() == 20 => Some(Address::from_slice(hash)),
            _ => None,
        }
    }

}

impl TxOutput {
    /// The output value in satoshis.
    pub fn sats(&self) -> u64 {
        (self.value * 1e8) as u64
    }
}

/// CashToken metadata attached to an output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    /// Fungible token amount, a decimal string.
    pub amount: String,
    /// Token category, a 64-char hex string.
    pub category: String,
    /// NFT payload, when the token carries one.
    #[serde(default)]
    pub nft: Option<TokenNft>,
}

/// The NFT half of a CashToken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenNft {
    /// Capability string: `none`, `mutable` or `minting`.
    #[serde(default)]
    pub capability: String,
    /// Commitment as reported by the node.
    #[serde(default)]
    pub commitment: String,
}

/// A block with fully decoded transactions (`getblock` verbosity 2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerboseBlock {
    /// Block hash.
    pub hash: String,
    /// Block height.
    pub height: u64,
    /// Decoded transactions.
    #[serde(default)]
    pub tx: Vec<RawTransaction>,
}

/// A wallet-view transaction (`gettransaction`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Transaction id.
    pub txid: String,
    /// Confirmation depth; negative for conflicted transactions.
    #[serde(default)]
    pub confirmations: i64,
    /// Raw transaction hex.
    #[serde(default)]
    pub hex: String,
}

/// An unspent output (`gettxout`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxOut {
    /// Confirmation depth of the enclosing block.
    #[serde(default)]
    pub confirmations: i64,
    /// Output value in whole coins.
    pub value: f64,
    /// The locking script.
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

/// One entry of a `testmempoolaccept` result array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MempoolAcceptResult {
    pub txid: String,
    pub allowed: bool,
    #[serde(rename = "reject-reason", default)]
    pub reject_reason: String,
}
