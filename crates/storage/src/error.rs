//! Store error types.

use thiserror::Error;

/// Errors surfaced by the log store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An indexed query matched more entries than the configured cap.
    #[error("too many results")]
    TooManyResults,
    /// Data read back from the store failed to decode. Implies store-level
    /// corruption; treated as fatal by callers, never masked.
    #[error("corrupt store data: {0}")]
    Corrupt(String),
}
