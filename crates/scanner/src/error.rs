//! Scanner error types.

use heron_client::ClientError;
use heron_primitives::CodecError;
use thiserror::Error;

/// Fatal errors surfaced by a scan round.
#[derive(Debug, Error)]
pub enum ScannerError {
    /// A source-chain call failed after exhausting its retries.
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Reasons a candidate transaction fails conversion.
///
/// Every variant except [`ConvertError::Client`] is structural: the
/// transaction is not a well-formed tagged transaction and conversion is
/// aborted for that transaction only. A client error means the round itself
/// cannot make progress and is propagated as fatal.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The first output is not a tagged null-data output.
    #[error("first output is not a tagged null-data output")]
    FirstOutputNotTagged,
    /// The second output is not a standard pay-to-address output.
    #[error("second output is not a pay-to-address output")]
    SecondOutputInvalid,
    /// A pay-to-address output carries a script with no extractable hash.
    #[error("pay-to-address output has no extractable script hash")]
    MalformedAddressScript,
    /// An input names no origin transaction (coinbase) or its origin cannot
    /// be found on the node yet.
    #[error("input origin is unresolvable")]
    UnresolvableInput,
    /// An input references an output index its origin transaction lacks.
    #[error("input references missing origin output {0}")]
    OriginOutputMissing(u32),
    /// The referenced origin output is not a standard pay-to-address output.
    #[error("origin output is not a pay-to-address output")]
    OriginScriptInvalid,
    /// A token amount string is not a decimal integer.
    #[error("malformed token amount: {0}")]
    InvalidTokenAmount(String),
    /// The transaction id is not a 32-byte hex string.
    #[error("malformed transaction id: {0}")]
    InvalidTxid(String),
    /// A script reported by the node is not valid hex.
    #[error("script is not valid hex")]
    InvalidScriptHex,
    /// Tagged-script or payload packing failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A source-chain call failed after exhausting its retries.
    #[error(transparent)]
    Client(#[from] ClientError),
}
