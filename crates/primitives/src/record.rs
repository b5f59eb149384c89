//! Packed 32-byte value and token-metadata records.

use crate::CodecError;
use alloy_primitives::{Address, B256, U256};

/// Source-chain amounts carry 8 decimals; virtual amounts carry 18. Every
/// satoshi amount is scaled by this factor before packing.
const AMOUNT_SCALE: u128 = 10u128.pow(10);

/// Maximum NFT commitment length accepted when packing token metadata.
pub const MAX_NFT_COMMITMENT_LEN: usize = 40;

/// A packed pay-to-address output or input: 20-byte script hash followed by
/// the 12-byte big-endian amount scaled to 18 decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueRecord(pub B256);

impl ValueRecord {
    /// Packs a script hash and a satoshi amount.
    pub fn new(script_hash: Address, sats: u64) -> Self {
        let mut out = [0u8; 32];
        out[..20].copy_from_slice(script_hash.as_slice());
        let scaled = sats as u128 * AMOUNT_SCALE;
        out[20..].copy_from_slice(&scaled.to_be_bytes()[4..]);
        Self(B256::new(out))
    }

    /// The 20-byte script hash half of the record.
    pub fn script_hash(&self) -> Address {
        Address::from_slice(&self.0[..20])
    }

    /// The record as a single big-endian word, the shape it takes inside the
    /// packed log payload.
    pub fn as_word(&self) -> U256 {
        U256::from_be_bytes(self.0.0)
    }

    /// Reconstructs a record from a payload word.
    pub fn from_word(word: U256) -> Self {
        Self(B256::new(word.to_be_bytes()))
    }
}

/// CashToken NFT capability, packed as a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum NftCapability {
    /// No NFT attached, or an unrecognized capability string.
    #[default]
    Unknown = 0,
    /// An immutable NFT.
    None = 1,
    /// A mutable NFT.
    Mutable = 2,
    /// A minting NFT.
    Minting = 3,
}

impl NftCapability {
    /// Maps the node's capability string onto the packed byte.
    pub fn parse(s: &str) -> Self {
        match s {
            "none" => Self::None,
            "mutable" => Self::Mutable,
            "minting" => Self::Minting,
            _ => Self::Unknown,
        }
    }
}

/// Packed token metadata attached to a source-chain output: four 32-byte
/// words — (script hash ‖ fungible amount), category, (commitment length ‖
/// capability ‖ first 8 commitment bytes right-aligned), commitment tail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenInfoRecord {
    /// 20-byte script hash followed by the 12-byte big-endian token amount.
    pub address_and_amount: B256,
    /// The 32-byte token category.
    pub category: B256,
    /// Byte 0: commitment length; byte 1: capability; bytes 24..32: the
    /// first eight commitment bytes.
    pub commitment_length_and_head: B256,
    /// Commitment bytes from index 8 onward, left-aligned.
    pub commitment_tail: B256,
}

impl TokenInfoRecord {
    /// Packs token metadata for the output (or resolved input) paying to
    /// `script_hash`.
    pub fn new(
        script_hash: Address,
        amount: u64,
        category: &[u8],
        capability: NftCapability,
        commitment: &[u8],
    ) -> Result<Self, CodecError> {
        if category.len() != 32 {
            return Err(CodecError::InvalidCategory(category.len()));
        }
        if commitment.len() > MAX_NFT_COMMITMENT_LEN {
            return Err(CodecError::CommitmentTooLong(commitment.len()));
        }

        let mut address_and_amount = [0u8; 32];
        address_and_amount[..20].copy_from_slice(script_hash.as_slice());
        address_and_amount[20..].copy_from_slice(&(amount as u128).to_be_bytes()[4..]);

        let mut head = [0u8; 32];
        head[0] = commitment.len() as u8;
        head[1] = capability as u8;
        let n = commitment.len().min(8);
        head[24..24 + n].copy_from_slice(&commitment[..n]);

        let mut tail = [0u8; 32];
        if commitment.len() > 8 {
            tail[..commitment.len() - 8].copy_from_slice(&commitment[8..]);
        }

        Ok(Self {
            address_and_amount: B256::new(address_and_amount),
            category: B256::from_slice(category),
            commitment_length_and_head: B256::new(head),
            commitment_tail: B256::new(tail),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const HASH: Address = address!("1234567890123456789012345678901234567890");

    #[test]
    fn value_record_scales_to_eighteen_decimals() {
        // 1.0 source unit = 1e8 sats, scaled x1e10 = 1e18.
        let rec = ValueRecord::new(HASH, 100_000_000);
        assert_eq!(&rec.0[..20], HASH.as_slice());
        let amount = U256::from_be_slice(&rec.0[20..]);
        assert_eq!(amount, U256::from(10).pow(U256::from(18)));
        assert_eq!(rec.script_hash(), HASH);
    }

    #[test]
    fn value_record_max_supply_fits_twelve_bytes() {
        // 21M coins in sats, scaled, stays below 2^96.
        let rec = ValueRecord::new(HASH, 21_000_000 * 100_000_000);
        assert_eq!(ValueRecord::from_word(rec.as_word()), rec);
    }

    #[test]
    fn token_record_packs_commitment_head_and_tail() {
        let commitment: Vec<u8> = (1..=12).collect();
        let rec =
            TokenInfoRecord::new(HASH, 500, &[0xcc; 32], NftCapability::Mutable, &commitment)
                .unwrap();
        let head = rec.commitment_length_and_head;
        assert_eq!(head[0], 12);
        assert_eq!(head[1], 2);
        assert_eq!(&head[24..], &commitment[..8]);
        assert_eq!(&rec.commitment_tail[..4], &commitment[8..]);
        assert_eq!(&rec.commitment_tail[4..], &[0u8; 28]);
        assert_eq!(&rec.address_and_amount[..20], HASH.as_slice());
        assert_eq!(U256::from_be_slice(&rec.address_and_amount[20..]), U256::from(500));
    }

    #[test]
    fn token_record_rejects_bad_category_and_commitment() {
        assert_eq!(
            TokenInfoRecord::new(HASH, 1, &[0u8; 31], NftCapability::None, &[]),
            Err(CodecError::InvalidCategory(31)),
        );
        assert_eq!(
            TokenInfoRecord::new(HASH, 1, &[0u8; 32], NftCapability::None, &[0u8; 41]),
            Err(CodecError::CommitmentTooLong(41)),
        );
    }

    #[test]
    fn capability_strings() {
        assert_eq!(NftCapability::parse("none"), NftCapability::None);
        assert_eq!(NftCapability::parse("mutable"), NftCapability::Mutable);
        assert_eq!(NftCapability::parse("minting"), NftCapability::Minting);
        assert_eq!(NftCapability::parse("other"), NftCapability::Unknown);
    }
}
