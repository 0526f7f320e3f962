use crate::config::StoreConfig;
use crate::store::{RouteStore, StoreError};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::collections::HashMap;

/// Redis-backed [`RouteStore`] keeping all mappings in one hash.
///
/// The [`ConnectionManager`] multiplexes and reconnects under the hood,
/// so each operation here is an independent network call with no
/// connection state owned by the caller.
pub struct RedisRouteStore {
    conn: ConnectionManager,
    hash_key: String,
}

impl RedisRouteStore {
    /// Connect to Redis and verify the connection with a ping.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        tracing::info!(host = %config.host, port = config.port, db = config.db, "connecting to redis");

        let client = redis::Client::open(config.connection_url())?;
        let mut conn = ConnectionManager::new(client).await?;

        let _: () = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!("redis connection established");

        Ok(Self {
            conn,
            hash_key: config.hash_key.clone(),
        })
    }
}

#[async_trait]
impl RouteStore for RedisRouteStore {
    async fn set_route(&self, domain: &str, port: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.hset(&self.hash_key, domain, port).await?;
        Ok(())
    }

    async fn delete_route(&self, domain: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.hdel(&self.hash_key, domain).await?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.conn.clone();
        let entries: HashMap<String, String> = conn.hgetall(&self.hash_key).await?;
        Ok(entries)
    }
}
