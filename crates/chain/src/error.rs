//! Producer error types.

use heron_scanner::ScannerError;
use heron_storage::StoreError;
use thiserror::Error;

/// Fatal errors ending the production loop.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The store rejected a read or write.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A scan round failed.
    #[error(transparent)]
    Scanner(#[from] ScannerError),
}
