//! Filter API error types.

use heron_storage::StoreError;
use jsonrpsee::types::ErrorObjectOwned;
use thiserror::Error;

/// Errors surfaced by the filter API.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The filter id is unknown or the filter has expired.
    #[error("filter not found")]
    NotFound,
    /// The filter exists but is not of the type the method requires.
    #[error("filter is not a log filter")]
    WrongType,
    /// The requested block hash is not on the virtual chain.
    #[error("unknown block")]
    UnknownBlock,
    /// The resolved block range is inverted.
    #[error("invalid block range")]
    InvalidRange,
    /// The store rejected the query.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FilterError> for ErrorObjectOwned {
    fn from(err: FilterError) -> Self {
        Self::owned(-32000, err.to_string(), None::<()>)
    }
}
