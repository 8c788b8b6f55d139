use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::errors::StorageError;

/// Hands out connections to the session store.
#[async_trait]
pub trait ConnectionPool: Send + Sync + 'static {
    /// Get a connection. A handler holds the returned connection for its whole lifetime.
    async fn get_connection(&self) -> Result<Box<dyn SessionConnection>, StorageError>;
}

/// Hash-oriented key-value commands used by the session handler.
///
/// The method names follow the Redis commands they stand for, and the return
/// values follow their replies: `hdel` and `del` report how many entries were
/// removed, `expire` reports whether a timeout was set.
#[async_trait]
pub trait SessionConnection: Send {
    /// Whether `key` exists.
    async fn exists(&mut self, key: &str) -> Result<bool, StorageError>;

    /// Set the time-to-live of `key`. Returns false when the key does not exist.
    async fn expire(&mut self, key: &str, seconds: u64) -> Result<bool, StorageError>;

    /// Write several fields of the hash at `key`, creating it if needed.
    async fn hmset(&mut self, key: &str, fields: &[(String, String)])
    -> Result<bool, StorageError>;

    /// All fields of the hash at `key`. Empty when the key does not exist.
    async fn hgetall(&mut self, key: &str) -> Result<HashMap<String, String>, StorageError>;

    /// A single field of the hash at `key`.
    async fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, StorageError>;

    /// Remove a field of the hash at `key`.
    async fn hdel(&mut self, key: &str, field: &str) -> Result<usize, StorageError>;

    /// Remove `key` together with its time-to-live.
    async fn del(&mut self, key: &str) -> Result<usize, StorageError>;

    /// Whether `field` exists in the hash at `key`.
    async fn hexists(&mut self, key: &str, field: &str) -> Result<bool, StorageError>;
}

pub struct RedisConnectionPool {
    pub(super) client: redis::Client,
}

pub struct RedisConnection {
    pub(super) conn: redis::aio::MultiplexedConnection,
}

/// Process-local pool. Every connection it hands out shares the same entries,
/// so it behaves like several clients of one server.
#[derive(Clone, Default)]
pub struct InMemoryConnectionPool {
    pub(super) entries: Arc<Mutex<HashMap<String, StoredHash>>>,
}

pub struct InMemoryConnection {
    pub(super) entries: Arc<Mutex<HashMap<String, StoredHash>>>,
}

#[derive(Debug, Clone, Default)]
pub(super) struct StoredHash {
    pub(super) fields: HashMap<String, String>,
    pub(super) expires_at: Option<DateTime<Utc>>,
    pub(super) ttl: Option<u64>,
}
