//! Test doubles for the session handler's collaborators

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

use crate::cookie::{RequestCookies, ResponseCookies, SessionCookie};
use crate::storage::{ConnectionPool, InMemoryConnectionPool, SessionConnection, StorageError};
use crate::utils::{IdGenerator, UtilError};

/// Hands out a fixed sequence of ids.
#[derive(Clone)]
pub(crate) struct ScriptedIdGenerator {
    ids: Arc<StdMutex<VecDeque<String>>>,
}

impl ScriptedIdGenerator {
    pub(crate) fn new(ids: &[&str]) -> Self {
        Self {
            ids: Arc::new(StdMutex::new(ids.iter().map(|s| s.to_string()).collect())),
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.ids.lock().map(|ids| ids.len()).unwrap_or(0)
    }
}

impl IdGenerator for ScriptedIdGenerator {
    fn generate(&self, _len: usize) -> Result<String, UtilError> {
        self.ids
            .lock()
            .ok()
            .and_then(|mut ids| ids.pop_front())
            .ok_or_else(|| UtilError::Crypto("Scripted ids exhausted".to_string()))
    }
}

/// Request cookies to read from, and a log of the cookies a handler issued.
#[derive(Debug, Default)]
pub(crate) struct RecordingCookies {
    pub(crate) cookies: HashMap<String, String>,
    pub(crate) issued: Vec<SessionCookie>,
    pub(crate) refuse: bool,
}

impl RecordingCookies {
    pub(crate) fn with_cookie(name: &str, value: &str) -> Self {
        Self {
            cookies: HashMap::from([(name.to_string(), value.to_string())]),
            ..Self::default()
        }
    }

    pub(crate) fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }
}

impl RequestCookies for RecordingCookies {
    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }
}

impl ResponseCookies for RecordingCookies {
    fn set_cookie(&mut self, cookie: &SessionCookie) -> bool {
        if self.refuse {
            return false;
        }
        self.issued.push(cookie.clone());
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecordedCall {
    Exists(String),
    Expire(String, u64),
    Hmset(String, Vec<String>),
    Hgetall(String),
    Hget(String, String),
    Hdel(String, String),
    Del(String),
    Hexists(String, String),
}

/// In-memory pool that logs every command, optionally refusing hash writes.
#[derive(Clone)]
pub(crate) struct RecordingPool {
    inner: InMemoryConnectionPool,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    reject_writes: bool,
}

impl RecordingPool {
    pub(crate) fn new() -> Self {
        Self {
            inner: InMemoryConnectionPool::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            reject_writes: false,
        }
    }

    pub(crate) fn rejecting_writes() -> Self {
        Self {
            reject_writes: true,
            ..Self::new()
        }
    }

    pub(crate) async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub(crate) async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }
}

#[async_trait]
impl ConnectionPool for RecordingPool {
    async fn get_connection(&self) -> Result<Box<dyn SessionConnection>, StorageError> {
        Ok(Box::new(RecordingConnection {
            inner: self.inner.get_connection().await?,
            calls: self.calls.clone(),
            reject_writes: self.reject_writes,
        }))
    }
}

struct RecordingConnection {
    inner: Box<dyn SessionConnection>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    reject_writes: bool,
}

async fn record(calls: &Mutex<Vec<RecordedCall>>, call: RecordedCall) {
    calls.lock().await.push(call);
}

#[async_trait]
impl SessionConnection for RecordingConnection {
    async fn exists(&mut self, key: &str) -> Result<bool, StorageError> {
        record(&self.calls, RecordedCall::Exists(key.to_string())).await;
        self.inner.exists(key).await
    }

    async fn expire(&mut self, key: &str, seconds: u64) -> Result<bool, StorageError> {
        record(&self.calls, RecordedCall::Expire(key.to_string(), seconds))
            .await;
        self.inner.expire(key, seconds).await
    }

    async fn hmset(
        &mut self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<bool, StorageError> {
        let names = fields.iter().map(|(f, _)| f.clone()).collect();
        record(&self.calls, RecordedCall::Hmset(key.to_string(), names)).await;
        if self.reject_writes {
            return Ok(false);
        }
        self.inner.hmset(key, fields).await
    }

    async fn hgetall(&mut self, key: &str) -> Result<HashMap<String, String>, StorageError> {
        record(&self.calls, RecordedCall::Hgetall(key.to_string())).await;
        self.inner.hgetall(key).await
    }

    async fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, StorageError> {
        record(&self.calls, RecordedCall::Hget(key.to_string(), field.to_string()))
            .await;
        self.inner.hget(key, field).await
    }

    async fn hdel(&mut self, key: &str, field: &str) -> Result<usize, StorageError> {
        record(&self.calls, RecordedCall::Hdel(key.to_string(), field.to_string()))
            .await;
        self.inner.hdel(key, field).await
    }

    async fn del(&mut self, key: &str) -> Result<usize, StorageError> {
        record(&self.calls, RecordedCall::Del(key.to_string())).await;
        self.inner.del(key).await
    }

    async fn hexists(&mut self, key: &str, field: &str) -> Result<bool, StorageError> {
        record(&self.calls, RecordedCall::Hexists(key.to_string(), field.to_string()))
            .await;
        self.inner.hexists(key, field).await
    }
}
