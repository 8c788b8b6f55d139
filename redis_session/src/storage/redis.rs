use async_trait::async_trait;
use redis::{self, AsyncCommands};
use std::collections::HashMap;

use crate::storage::errors::StorageError;

use super::types::{ConnectionPool, RedisConnection, RedisConnectionPool, SessionConnection};

impl RedisConnectionPool {
    pub fn open(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)
            .map_err(|e| StorageError::Connection(format!("Invalid store URL: {e}")))?;
        tracing::info!("Opened Redis client for session storage");
        Ok(Self { client })
    }

    /// Verify the server is reachable.
    pub async fn init(&self) -> Result<(), StorageError> {
        let _conn = self.client.get_multiplexed_async_connection().await?;
        Ok(())
    }
}

#[async_trait]
impl ConnectionPool for RedisConnectionPool {
    async fn get_connection(&self) -> Result<Box<dyn SessionConnection>, StorageError> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(Box::new(RedisConnection { conn }))
    }
}

#[async_trait]
impl SessionConnection for RedisConnection {
    async fn exists(&mut self, key: &str) -> Result<bool, StorageError> {
        let exists: bool = self.conn.exists(key).await?;
        Ok(exists)
    }

    async fn expire(&mut self, key: &str, seconds: u64) -> Result<bool, StorageError> {
        let applied: bool = self.conn.expire(key, expire_seconds(seconds)?).await?;
        Ok(applied)
    }

    async fn hmset(
        &mut self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<bool, StorageError> {
        // HMSET answers with a plain OK; any failure surfaces as an error reply
        let _: () = self.conn.hset_multiple(key, fields).await?;
        Ok(true)
    }

    async fn hgetall(&mut self, key: &str) -> Result<HashMap<String, String>, StorageError> {
        let fields: HashMap<String, String> = self.conn.hgetall(key).await?;
        Ok(fields)
    }

    async fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, StorageError> {
        let value: Option<String> = self.conn.hget(key, field).await?;
        Ok(value)
    }

    async fn hdel(&mut self, key: &str, field: &str) -> Result<usize, StorageError> {
        let removed: usize = self.conn.hdel(key, field).await?;
        Ok(removed)
    }

    async fn del(&mut self, key: &str) -> Result<usize, StorageError> {
        let removed: usize = self.conn.del(key).await?;
        Ok(removed)
    }

    async fn hexists(&mut self, key: &str, field: &str) -> Result<bool, StorageError> {
        let exists: bool = self.conn.hexists(key, field).await?;
        Ok(exists)
    }
}

/// EXPIRE takes a signed count; anything above `i64::MAX` would wrap negative
/// and delete the key.
fn expire_seconds(seconds: u64) -> Result<i64, StorageError> {
    i64::try_from(seconds)
        .map_err(|_| StorageError::Command(format!("Invalid expire time: {seconds}s")))
}
