//! Tagged null-data script parsing and the packed log-payload codec.
//!
//! A tagged transaction's first output carries an unspendable null-data
//! script used purely as a payload channel. The script starts with a fixed
//! six-byte magic (OP_RETURN, a four-byte push, the tag) and the remaining
//! pushed elements are interpreted positionally: element 0 is the contract
//! address, elements 1-4 are topics, anything after that is opaque extra
//! data.
//!
//! The packed payload attached to every synthetic log is the canonical ABI
//! dynamic-tuple encoding of `(confirmations, outputs, inputs,
//! outputTokenInfos, inputTokenInfos, otherData)`. One encoder/decoder pair
//! serves both the building and the reading side.

use crate::{CodecError, TokenInfoRecord, ValueRecord};
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{SolValue, sol};

/// The six-byte magic every tagged null-data script starts with: OP_RETURN
/// (0x6a), a four-byte push (0x04), and the tag bytes `EGTX`.
pub const TAGGED_PREFIX: [u8; 6] = [0x6a, 0x04, 0x45, 0x47, 0x54, 0x58];

sol! {
    /// Wire shape of a [`TokenInfoRecord`] inside the packed payload.
    struct TokenInfo {
        uint256 addressAndTokenAmount;
        uint256 tokenCategory;
        uint256 nftCommitmentLengthAndHead;
        uint256 nftCommitmentTail;
    }
}

/// The six payload fields in head/tail encoding order.
type PayloadTuple = (U256, Vec<U256>, Vec<U256>, Vec<TokenInfo>, Vec<TokenInfo>, Vec<Bytes>);

/// The header decoded from a tagged null-data script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggedHeader {
    /// Contract address, right-aligned from the first pushed element. Zero
    /// when the script carries no pushes past the magic.
    pub address: Address,
    /// Topics from push positions 1-4. Empty pushes are skipped: an empty
    /// element means "topic absent", not a zero topic.
    pub topics: Vec<B256>,
    /// Pushed elements from position 5 onward, passed through verbatim.
    pub extra_data: Vec<Bytes>,
}

/// Fixed-width conversion: right-align the input within `N` bytes, padding
/// with zeros on the left, or keep only the first `N` bytes when the input
/// is longer.
pub fn right_align<const N: usize>(data: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let l = data.len();
    if l <= N {
        out[N - l..].copy_from_slice(data);
    } else {
        out.copy_from_slice(&data[..N]);
    }
    out
}

/// Collects every pushed data element in a script, in order.
///
/// Direct pushes (0x01-0x4b), OP_PUSHDATA1/2/4 and OP_0 (an empty push) all
/// contribute an element; other opcodes contribute nothing. A push that
/// announces more data than the script holds is an error.
pub fn pushed_data(script: &[u8]) -> Result<Vec<Vec<u8>>, CodecError> {
    let mut elements = Vec::new();
    let mut i = 0usize;
    while i < script.len() {
        let op = script[i];
        i += 1;
        let len = match op {
            0x00 => 0,
            0x01..=0x4b => op as usize,
            0x4c => {
                let n = *script.get(i).ok_or(CodecError::TruncatedPush)? as usize;
                i += 1;
                n
            }
            0x4d => {
                let bytes = script.get(i..i + 2).ok_or(CodecError::TruncatedPush)?;
                i += 2;
                u16::from_le_bytes([bytes[0], bytes[1]]) as usize
            }
            0x4e => {
                let bytes = script.get(i..i + 4).ok_or(CodecError::TruncatedPush)?;
                i += 4;
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
            }
            _ => continue,
        };
        let data = script.get(i..i + len).ok_or(CodecError::TruncatedPush)?;
        i += len;
        elements.push(data.to_vec());
    }
    Ok(elements)
}

/// Parses a tagged null-data script into its positional header.
///
/// The script must start with [`TAGGED_PREFIX`]; the pushes after it are
/// interpreted positionally.
pub fn parse_tagged_script(script: &[u8]) -> Result<TaggedHeader, CodecError> {
    let body = script.strip_prefix(TAGGED_PREFIX.as_slice()).ok_or(CodecError::MissingTagPrefix)?;
    parse_tagged_body(body)
}

/// Parses the pushes after the magic into a [`TaggedHeader`].
pub(crate) fn parse_tagged_body(body: &[u8]) -> Result<TaggedHeader, CodecError> {
    let mut header = TaggedHeader::default();
    for (i, element) in pushed_data(body)?.into_iter().enumerate() {
        match i {
            0 => header.address = Address::new(right_align::<20>(&element)),
            1..=4 => {
                if !element.is_empty() {
                    header.topics.push(B256::new(right_align::<32>(&element)));
                }
            }
            _ => header.extra_data.push(element.into()),
        }
    }
    Ok(header)
}

/// The structured content of a synthetic log's data blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPayload {
    /// Source-chain confirmation count. Packed as zero at indexing time and
    /// refreshed at retrieval.
    pub confirmations: U256,
    /// One [`ValueRecord`] per pay-to-address output.
    pub outputs: Vec<ValueRecord>,
    /// One [`ValueRecord`] per resolved input.
    pub inputs: Vec<ValueRecord>,
    /// Token metadata attached to pay-to-address outputs.
    pub output_token_infos: Vec<TokenInfoRecord>,
    /// Token metadata attached to resolved inputs.
    pub input_token_infos: Vec<TokenInfoRecord>,
    /// Extra opaque chunks: embedded extra data from the tagged script
    /// followed by the pushes of any additional null-data outputs.
    pub other_data: Vec<Bytes>,
}

impl LogPayload {
    /// Packs the payload into its canonical binary form.
    pub fn encode(&self) -> Bytes {
        let tuple: PayloadTuple = (
            self.confirmations,
            self.outputs.iter().map(ValueRecord::as_word).collect(),
            self.inputs.iter().map(ValueRecord::as_word).collect(),
            self.output_token_infos.iter().map(TokenInfo::from).collect(),
            self.input_token_infos.iter().map(TokenInfo::from).collect(),
            self.other_data.clone(),
        );
        tuple.abi_encode_params().into()
    }

    /// Unpacks a payload blob. Exact inverse of [`Self::encode`].
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let (confirmations, outputs, inputs, output_infos, input_infos, other_data) =
            PayloadTuple::abi_decode_params(data)?;
        Ok(Self {
            confirmations,
            outputs: outputs.into_iter().map(ValueRecord::from_word).collect(),
            inputs: inputs.into_iter().map(ValueRecord::from_word).collect(),
            output_token_infos: output_infos.iter().map(TokenInfoRecord::from).collect(),
            input_token_infos: input_infos.iter().map(TokenInfoRecord::from).collect(),
            other_data,
        })
    }
}

impl From<&TokenInfoRecord> for TokenInfo {
    fn from(rec: &TokenInfoRecord) -> Self {
        Self {
            addressAndTokenAmount: U256::from_be_bytes(rec.address_and_amount.0),
            tokenCategory: U256::from_be_bytes(rec.category.0),
            nftCommitmentLengthAndHead: U256::from_be_bytes(rec.commitment_length_and_head.0),
            nftCommitmentTail: U256::from_be_bytes(rec.commitment_tail.0),
        }
    }
}

impl From<&TokenInfo> for TokenInfoRecord {
    fn from(info: &TokenInfo) -> Self {
        Self {
            address_and_amount: B256::new(info.addressAndTokenAmount.to_be_bytes()),
            category: B256::new(info.tokenCategory.to_be_bytes()),
            commitment_length_and_head: B256::new(info.nftCommitmentLengthAndHead.to_be_bytes()),
            commitment_tail: B256::new(info.nftCommitmentTail.to_be_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NftCapability;
    use alloy_primitives::{address, hex};
    use rstest::rstest;

    #[rstest]
    #[case::shorter(&[0xab, 0xcd], {
        let mut want = [0u8; 4];
        want[2] = 0xab;
        want[3] = 0xcd;
        want
    })]
    #[case::exact(&[1, 2, 3, 4], [1, 2, 3, 4])]
    #[case::longer(&[1, 2, 3, 4, 5, 6], [1, 2, 3, 4])]
    #[case::empty(&[], [0u8; 4])]
    fn fixed_width_conversion(#[case] input: &[u8], #[case] want: [u8; 4]) {
        assert_eq!(right_align::<4>(input), want);
    }

    #[test]
    fn fixed_width_matches_for_both_widths() {
        let data = [0x11u8; 25];
        let as20 = right_align::<20>(&data);
        assert_eq!(as20, [0x11u8; 20]);
        let as32 = right_align::<32>(&data);
        assert_eq!(&as32[..7], &[0u8; 7]);
        assert_eq!(&as32[7..], &data[..]);
    }

    #[test]
    fn pushed_data_collects_all_push_forms() {
        let mut script = vec![0x02, 0xaa, 0xbb]; // direct push
        script.push(0x00); // OP_0, empty push
        script.extend_from_slice(&[0x4c, 0x01, 0xcc]); // OP_PUSHDATA1
        script.extend_from_slice(&[0x4d, 0x02, 0x00, 0xdd, 0xee]); // OP_PUSHDATA2
        let elements = pushed_data(&script).unwrap();
        assert_eq!(elements, vec![vec![0xaa, 0xbb], vec![], vec![0xcc], vec![0xdd, 0xee]]);
    }

    #[test]
    fn pushed_data_rejects_truncated_pushes() {
        assert_eq!(pushed_data(&[0x05, 0x01]), Err(CodecError::TruncatedPush));
        assert_eq!(pushed_data(&[0x4c]), Err(CodecError::TruncatedPush));
        assert_eq!(pushed_data(&[0x4d, 0x10, 0x00, 0x01]), Err(CodecError::TruncatedPush));
    }

    #[test]
    fn parse_tagged_script_positional_layout() {
        let mut script = TAGGED_PREFIX.to_vec();
        script.extend_from_slice(&[0x02, 0xca, 0xfe]); // address, right-aligned
        script.extend_from_slice(&[0x01, 0x01]); // topic 0
        script.push(0x00); // topic slot 1 absent
        script.extend_from_slice(&[0x01, 0x02]); // topic 2
        script.push(0x00); // topic slot 3 absent
        script.extend_from_slice(&[0x03, 0x0a, 0x0b, 0x0c]); // extra data

        let header = parse_tagged_script(&script).unwrap();
        assert_eq!(header.address, address!("000000000000000000000000000000000000cafe"));
        assert_eq!(
            header.topics,
            vec![
                B256::with_last_byte(0x01),
                B256::with_last_byte(0x02),
            ]
        );
        assert_eq!(header.extra_data, vec![Bytes::from(vec![0x0a, 0x0b, 0x0c])]);
    }

    #[test]
    fn parse_tagged_script_requires_magic() {
        assert_eq!(
            parse_tagged_script(&hex!("6a04deadbeef0101")),
            Err(CodecError::MissingTagPrefix)
        );
        assert_eq!(parse_tagged_script(&[]), Err(CodecError::MissingTagPrefix));
    }

    #[test]
    fn empty_tagged_script_yields_default_header() {
        let header = parse_tagged_script(&TAGGED_PREFIX).unwrap();
        assert_eq!(header, TaggedHeader::default());
    }

    #[test]
    fn payload_round_trips_empty_arrays() {
        let payload = LogPayload { confirmations: U256::from(5), ..Default::default() };
        let encoded = payload.encode();
        assert_eq!(LogPayload::decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn empty_payload_golden_layout() {
        // Six head words (one scalar, five tail offsets) followed by five
        // zero length words.
        let payload = LogPayload { confirmations: U256::from(5), ..Default::default() };
        let encoded = payload.encode();
        assert_eq!(encoded.len(), 11 * 32);
        assert_eq!(U256::from_be_slice(&encoded[..32]), U256::from(5));
        for (i, offset) in [0xc0u64, 0xe0, 0x100, 0x120, 0x140].iter().enumerate() {
            let word = &encoded[(i + 1) * 32..(i + 2) * 32];
            assert_eq!(U256::from_be_slice(word), U256::from(*offset));
        }
        assert_eq!(&encoded[6 * 32..], &[0u8; 5 * 32][..]);
    }

    #[test]
    fn payload_round_trips_full_content() {
        let hash = address!("1234567890123456789012345678901234567890");
        let token =
            TokenInfoRecord::new(hash, 7, &[0xee; 32], NftCapability::Minting, &[1, 2, 3]).unwrap();
        let payload = LogPayload {
            confirmations: U256::ZERO,
            outputs: vec![ValueRecord::new(hash, 100_000_000), ValueRecord::new(hash, 1)],
            inputs: vec![ValueRecord::new(hash, 42)],
            output_token_infos: vec![token],
            input_token_infos: vec![token, token],
            other_data: vec![Bytes::from_static(b"hello"), Bytes::new()],
        };
        let encoded = payload.encode();
        assert_eq!(LogPayload::decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(LogPayload::decode(&[0xffu8; 16]).is_err());
    }
}
