//! Client error types.

use thiserror::Error;

/// Errors surfaced by the source-chain client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The node returned a JSON-RPC error object.
    #[error("node error {code}: {message}")]
    Rpc {
        /// The node's error code.
        code: i64,
        /// The node's error message.
        message: String,
    },
    /// The response envelope did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The node refused to admit a transaction to its mempool.
    #[error("transaction rejected: {0}")]
    Rejected(String),
    /// The result payload failed to deserialize.
    #[error("malformed result: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;
