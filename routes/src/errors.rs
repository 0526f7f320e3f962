use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by route management operations.
#[derive(Error, Debug)]
pub enum RoutesError {
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("domain name must not be empty")]
    EmptyDomain,

    #[error("invalid backend port: {0}")]
    InvalidPort(String),
}
