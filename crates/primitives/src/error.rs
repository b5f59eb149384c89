//! Codec error types.

use thiserror::Error;

/// Errors produced while decoding tagged scripts or packed log payloads.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The script does not start with the tagged null-data prefix.
    #[error("script is missing the tagged null-data prefix")]
    MissingTagPrefix,
    /// A push opcode announced more data than the script contains.
    #[error("truncated push data in script")]
    TruncatedPush,
    /// A token category word must be exactly 32 bytes.
    #[error("token category must be 32 bytes, got {0}")]
    InvalidCategory(usize),
    /// An NFT commitment longer than the consensus maximum.
    #[error("nft commitment too long: {0} bytes")]
    CommitmentTooLong(usize),
    /// The packed log payload failed to ABI-decode.
    #[error("invalid packed log payload: {0}")]
    Abi(#[from] alloy_sol_types::Error),
}
