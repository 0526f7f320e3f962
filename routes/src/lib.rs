//! Route management: the in-memory routing table, its durable backing
//! store, and the control API that mutates both.

pub mod api;
pub mod config;
pub mod errors;
pub mod manager;
pub mod metrics_defs;
pub mod redis_store;
pub mod store;
pub mod table;
pub mod testutils;
