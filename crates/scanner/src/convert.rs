//! Conversion of a verbose source-chain transaction into a virtual
//! transaction.
//!
//! A well-formed tagged transaction has a tagged null-data script as output
//! zero and a standard pay-to-address output as output one. Every further
//! pay-to-address output contributes a receiver record, every further
//! null-data output contributes opaque extra chunks, and every input is
//! resolved against its origin transaction to a sender record.

use crate::ConvertError;
use alloy_primitives::{Address, B256, Bytes, U256, hex};
use heron_client::{ChainClient, ClientError, RawTransaction, ScriptKind, TokenData};
use heron_primitives::{
    EgtxLog, LogPayload, TaggedHeader, TokenInfoRecord, ValueRecord, VirtualTransaction,
    parse_tagged_script, pushed_data,
};
use tracing::debug;

/// Converts one verbose transaction into a virtual transaction slotted at
/// `tx_index` of the virtual block under construction.
///
/// Input origins are resolved through `client`; a not-found origin is a
/// structural [`ConvertError::UnresolvableInput`], any other client failure
/// is propagated as [`ConvertError::Client`].
pub async fn convert_tagged_tx<C: ChainClient>(
    client: &C,
    tx: &RawTransaction,
    tx_index: u64,
    block_number: u64,
    block_hash: B256,
) -> Result<VirtualTransaction, ConvertError> {
    let mut header: Option<TaggedHeader> = None;
    let mut outputs = Vec::new();
    let mut output_token_infos = Vec::new();
    let mut other_data: Vec<Bytes> = Vec::new();

    for (i, out) in tx.vout.iter().enumerate() {
        let spk = &out.script_pub_key;
        if i == 0 {
            if spk.kind != ScriptKind::NullData {
                return Err(ConvertError::FirstOutputNotTagged);
            }
            let script = hex::decode(&spk.hex).map_err(|_| ConvertError::InvalidScriptHex)?;
            let parsed = parse_tagged_script(&script)?;
            other_data.extend(parsed.extra_data.iter().cloned());
            header = Some(parsed);
            continue;
        }
        if i == 1 && !spk.kind.is_pay_to_address() {
            return Err(ConvertError::SecondOutputInvalid);
        }
        if spk.kind.is_pay_to_address() {
            let hash = spk.script_hash().ok_or(ConvertError::MalformedAddressScript)?;
            outputs.push(ValueRecord::new(hash, out.sats()));
            if let Some(token) = &out.token_data {
                match token_record(hash, token) {
                    Ok(rec) => output_token_infos.push(rec),
                    Err(err) => {
                        debug!(target: "scanner", %err, txid = tx.txid, vout = out.n, "skipping output token record")
                    }
                }
            }
        } else if spk.kind == ScriptKind::NullData {
            // Trailing data carriers ride along verbatim; a malformed one is
            // ignored rather than failing the whole transaction.
            if let Ok(script) = hex::decode(&spk.hex) {
                if let Ok(pushes) = pushed_data(&script) {
                    other_data.extend(pushes.into_iter().map(Bytes::from));
                }
            }
        }
    }
    let header = header.ok_or(ConvertError::FirstOutputNotTagged)?;

    let mut inputs = Vec::new();
    let mut input_token_infos = Vec::new();
    for vin in &tx.vin {
        let (origin_txid, origin_vout) = match (&vin.txid, vin.vout) {
            (Some(txid), Some(vout)) => (txid, vout),
            _ => return Err(ConvertError::UnresolvableInput),
        };
        let origin = match client.raw_transaction_verbose(origin_txid).await {
            Ok(origin) => origin,
            Err(ClientError::Rpc { code: -5, .. }) => return Err(ConvertError::UnresolvableInput),
            Err(err) => return Err(ConvertError::Client(err)),
        };
        let out = origin
            .vout
            .get(origin_vout as usize)
            .ok_or(ConvertError::OriginOutputMissing(origin_vout))?;
        if !out.script_pub_key.kind.is_pay_to_address() {
            return Err(ConvertError::OriginScriptInvalid);
        }
        let hash = out.script_pub_key.script_hash().ok_or(ConvertError::OriginScriptInvalid)?;
        inputs.push(ValueRecord::new(hash, out.sats()));
        if let Some(token) = &out.token_data {
            match token_record(hash, token) {
                Ok(rec) => input_token_infos.push(rec),
                Err(err) => {
                    debug!(target: "scanner", %err, txid = tx.txid, origin = origin_txid, "skipping input token record")
                }
            }
        }
    }

    let hash: B256 =
        tx.txid.parse().map_err(|_| ConvertError::InvalidTxid(tx.txid.clone()))?;
    let from = inputs.first().map(ValueRecord::script_hash).unwrap_or_default();
    let to = outputs.first().map(ValueRecord::script_hash).unwrap_or_default();

    let payload = LogPayload {
        confirmations: U256::ZERO,
        outputs,
        inputs,
        output_token_infos,
        input_token_infos,
        other_data,
    };
    let log = EgtxLog {
        address: header.address,
        topics: header.topics,
        data: payload.encode(),
        block_number,
        block_hash,
        tx_hash: hash,
        tx_index,
    };
    Ok(VirtualTransaction { hash, from, to, block_number, block_hash, tx_index, log })
}

/// Packs the token metadata of an output paying to `script_hash`.
fn token_record(script_hash: Address, token: &TokenData) -> Result<TokenInfoRecord, ConvertError> {
    let amount = token
        .amount
        .parse::<u64>()
        .map_err(|_| ConvertError::InvalidTokenAmount(token.amount.clone()))?;
    let category =
        hex::decode(&token.category).map_err(|_| ConvertError::InvalidScriptHex)?;
    let (capability, commitment) = match &token.nft {
        Some(nft) => {
            (heron_primitives::NftCapability::parse(&nft.capability), nft.commitment.as_bytes())
        }
        None => (heron_primitives::NftCapability::Unknown, &[][..]),
    };
    Ok(TokenInfoRecord::new(script_hash, amount, &category, capability, commitment)?)
}
