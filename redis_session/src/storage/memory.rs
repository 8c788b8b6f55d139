use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;

use crate::storage::errors::StorageError;

use super::types::{
    ConnectionPool, InMemoryConnection, InMemoryConnectionPool, SessionConnection, StoredHash,
};

impl InMemoryConnectionPool {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory session connection pool");
        Self::default()
    }

    /// The time-to-live most recently applied to `key`, if it is live and has one.
    pub async fn ttl(&self, key: &str) -> Option<u64> {
        let mut entries = self.entries.lock().await;
        live_entry(&mut entries, key).and_then(|entry| entry.ttl)
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let mut entries = self.entries.lock().await;
        sweep_expired(&mut entries);
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn is_expired(entry: &StoredHash) -> bool {
    entry.expires_at.is_some_and(|at| at <= Utc::now())
}

/// Drop every expired key, including those nobody will ask for again.
fn sweep_expired(entries: &mut HashMap<String, StoredHash>) {
    let before = entries.len();
    entries.retain(|_, entry| !is_expired(entry));
    let swept = before - entries.len();
    if swept > 0 {
        tracing::debug!("Swept {} expired session keys", swept);
    }
}

/// Drop `key` if it has expired, then return it if it is still there.
fn live_entry<'a>(
    entries: &'a mut HashMap<String, StoredHash>,
    key: &str,
) -> Option<&'a mut StoredHash> {
    if entries.get(key).is_some_and(is_expired) {
        tracing::debug!("Evicting expired session key: {}", key);
        entries.remove(key);
    }
    entries.get_mut(key)
}

#[async_trait]
impl ConnectionPool for InMemoryConnectionPool {
    async fn get_connection(&self) -> Result<Box<dyn SessionConnection>, StorageError> {
        Ok(Box::new(InMemoryConnection {
            entries: self.entries.clone(),
        }))
    }
}

#[async_trait]
impl SessionConnection for InMemoryConnection {
    async fn exists(&mut self, key: &str) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock().await;
        Ok(live_entry(&mut entries, key).is_some())
    }

    async fn expire(&mut self, key: &str, seconds: u64) -> Result<bool, StorageError> {
        let expires_at = i64::try_from(seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| StorageError::Command(format!("Invalid expire time: {seconds}s")))?;

        let mut entries = self.entries.lock().await;
        sweep_expired(&mut entries);
        let Some(entry) = live_entry(&mut entries, key) else {
            return Ok(false);
        };
        entry.expires_at = Some(expires_at);
        entry.ttl = Some(seconds);
        Ok(true)
    }

    async fn hmset(
        &mut self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock().await;
        sweep_expired(&mut entries);
        if live_entry(&mut entries, key).is_none() {
            entries.insert(key.to_string(), StoredHash::default());
        }
        let entry = entries
            .get_mut(key)
            .ok_or_else(|| StorageError::Command(format!("Hash vanished while writing {key}")))?;
        for (field, value) in fields {
            entry.fields.insert(field.clone(), value.clone());
        }
        Ok(true)
    }

    async fn hgetall(&mut self, key: &str) -> Result<HashMap<String, String>, StorageError> {
        let mut entries = self.entries.lock().await;
        Ok(live_entry(&mut entries, key)
            .map(|entry| entry.fields.clone())
            .unwrap_or_default())
    }

    async fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, StorageError> {
        let mut entries = self.entries.lock().await;
        Ok(live_entry(&mut entries, key).and_then(|entry| entry.fields.get(field).cloned()))
    }

    async fn hdel(&mut self, key: &str, field: &str) -> Result<usize, StorageError> {
        let mut entries = self.entries.lock().await;
        let Some(entry) = live_entry(&mut entries, key) else {
            return Ok(0);
        };
        let removed = usize::from(entry.fields.remove(field).is_some());
        // Redis drops a hash once its last field is gone
        if entry.fields.is_empty() {
            entries.remove(key);
        }
        Ok(removed)
    }

    async fn del(&mut self, key: &str) -> Result<usize, StorageError> {
        let mut entries = self.entries.lock().await;
        let removed = live_entry(&mut entries, key).is_some();
        entries.remove(key);
        Ok(usize::from(removed))
    }

    async fn hexists(&mut self, key: &str, field: &str) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock().await;
        Ok(live_entry(&mut entries, key).is_some_and(|entry| entry.fields.contains_key(field)))
    }
}
