use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Errors surfaced by a [`RouteStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable backing store for route mappings.
///
/// All mappings live in a single logical collection keyed by domain
/// name; the trait only requires set-field, delete-field and
/// get-all-fields semantics. Connection management and retries belong
/// to the implementation.
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// Persist `domain -> port`, overwriting any previous value.
    async fn set_route(&self, domain: &str, port: &str) -> Result<(), StoreError>;

    /// Delete the mapping for `domain`. Deleting an absent domain is not
    /// an error.
    async fn delete_route(&self, domain: &str) -> Result<(), StoreError>;

    /// All persisted mappings.
    async fn fetch_all(&self) -> Result<HashMap<String, String>, StoreError>;
}
