use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::cookie::{RequestCookies, ResponseCookies, SessionCookie};
use crate::errors::SessionError;
use crate::storage::{ConnectionPool, SessionConnection};
use crate::utils::{AlphanumericIdGenerator, IdGenerator};

/// Schema-less session value: null, bool, number, string, array or object.
pub type SessionValue = Value;

/// One visitor's session, stored as a hash under `key_prefix + session_id`.
///
/// A handler holds a single store connection for its lifetime and serves one
/// request at a time. Call [`before_request`](Self::before_request) at the start
/// of every request to resolve the session id from the request cookie, or to
/// create a fresh one, before using the field operations.
///
/// New ids are checked against the store before they are committed, but the
/// check and the first write are separate commands: two processes can still
/// pick the same id in between. With the default 26 alphanumeric characters
/// that is not a practical concern.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use http::HeaderMap;
/// use redis_session::{InMemoryConnectionPool, SessionConfig, SessionHandler};
///
/// # async fn run(request: HeaderMap) -> Result<(), redis_session::SessionError> {
/// let pool = Arc::new(InMemoryConnectionPool::new());
/// let mut session = SessionHandler::new(Arc::new(SessionConfig::default()), Some(pool));
/// session.initialize().await?;
///
/// session.before_request(&request).await?;
/// let mut response = HeaderMap::new();
/// session.set("user", &"alice", &mut response).await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionHandler {
    config: Arc<SessionConfig>,
    pool: Option<Arc<dyn ConnectionPool>>,
    connection: Option<Box<dyn SessionConnection>>,
    id_generator: Box<dyn IdGenerator>,
    session_id: String,
    key: String,
}

impl SessionHandler {
    pub fn new(config: Arc<SessionConfig>, pool: Option<Arc<dyn ConnectionPool>>) -> Self {
        Self {
            config,
            pool,
            connection: None,
            id_generator: Box::new(AlphanumericIdGenerator),
            session_id: String::new(),
            key: String::new(),
        }
    }

    /// Replace the source of new session ids.
    pub fn with_id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Box::new(id_generator);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Check the settings and acquire the connection from the pool, if one is
    /// configured.
    ///
    /// Without a pool this succeeds and the handler stays unconnected; store
    /// operations then fail with [`SessionError::NoConnection`].
    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        self.config.validate()?;
        let Some(pool) = &self.pool else {
            tracing::debug!("No connection pool configured; deferring to first use");
            return Ok(());
        };
        self.connection = Some(pool.get_connection().await?);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Resolve the session for the current request and renew its time-to-live.
    #[tracing::instrument(skip_all)]
    pub async fn before_request(
        &mut self,
        request: &dyn RequestCookies,
    ) -> Result<(), SessionError> {
        if !self.load_session_id(request) {
            self.create_session_id().await?;
        }

        let max_lifetime = self.config.max_lifetime;
        let conn = connected(&mut self.connection)?;
        // A session created just now has no entry yet, so this is false until the first write
        let renewed = conn.expire(&self.key, max_lifetime).await?;
        tracing::debug!("Session {} ttl renewed: {}", self.key, renewed);
        Ok(())
    }

    /// Take the session id from the request cookie.
    ///
    /// The id is used as is; whether the store knows it is not checked. A
    /// cookie with an empty value counts as absent.
    pub fn load_session_id(&mut self, request: &dyn RequestCookies) -> bool {
        let Some(session_id) = request.cookie(&self.config.cookie_name) else {
            tracing::debug!("No session cookie '{}' found", self.config.cookie_name);
            return false;
        };
        if session_id.is_empty() {
            tracing::debug!("Ignoring empty session cookie '{}'", self.config.cookie_name);
            return false;
        }
        self.assign_session_id(session_id);
        true
    }

    /// Generate session ids until one is not taken in the store, and commit it.
    pub async fn create_session_id(&mut self) -> Result<bool, SessionError> {
        let len = self.config.session_id_length;
        if len == 0 {
            return Err(SessionError::Config(
                "session_id_length must be at least 1".to_string(),
            ));
        }
        loop {
            let candidate = self.id_generator.generate(len)?;
            let candidate_key = self.config.storage_key(&candidate);
            if connected(&mut self.connection)?
                .exists(&candidate_key)
                .await?
            {
                tracing::debug!("Session id collision, generating another");
                continue;
            }
            self.assign_session_id(candidate);
            return Ok(true);
        }
    }

    /// Current session id; empty until it is loaded or created.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current storage key; empty until the session id is loaded or created.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Forget the session id of the finished request.
    pub fn reset(&mut self) {
        self.session_id.clear();
        self.key.clear();
    }

    /// Send the session id to the client.
    pub fn set_cookie(&self, response: &mut dyn ResponseCookies) -> bool {
        response.set_cookie(&SessionCookie::from_config(&self.config, &self.session_id))
    }

    /// Store `value` under `field`, renew the time-to-live and refresh the cookie.
    ///
    /// Returns false, without issuing a cookie, when the store rejects the write.
    #[tracing::instrument(skip(self, value, response))]
    pub async fn set<T: Serialize + ?Sized>(
        &mut self,
        field: &str,
        value: &T,
        response: &mut dyn ResponseCookies,
    ) -> Result<bool, SessionError> {
        self.ensure_resolved()?;
        let encoded = serde_json::to_string(value)?;
        let max_lifetime = self.config.max_lifetime;

        let conn = connected(&mut self.connection)?;
        let written = conn
            .hmset(&self.key, &[(field.to_string(), encoded)])
            .await?;
        if let Err(e) = conn.expire(&self.key, max_lifetime).await {
            tracing::warn!("Failed to renew ttl of {}: {}", self.key, e);
        }

        if !written {
            tracing::debug!("Store rejected write of field {} to {}", field, self.key);
            return Ok(false);
        }

        if !self.set_cookie(response) {
            tracing::warn!("Failed to issue session cookie for {}", self.session_id);
        }
        Ok(true)
    }

    /// Value of `field`, or `None` when the field is absent.
    ///
    /// A stored null comes back as `Some(Value::Null)`.
    pub async fn get(&mut self, field: &str) -> Result<Option<SessionValue>, SessionError> {
        self.ensure_resolved()?;
        let conn = connected(&mut self.connection)?;
        match conn.hget(&self.key, field).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Value of `field` decoded into `T`.
    pub async fn get_as<T: DeserializeOwned>(
        &mut self,
        field: &str,
    ) -> Result<Option<T>, SessionError> {
        self.ensure_resolved()?;
        let conn = connected(&mut self.connection)?;
        match conn.hget(&self.key, field).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Every field of the session. Empty when nothing has been stored.
    pub async fn get_all(&mut self) -> Result<HashMap<String, SessionValue>, SessionError> {
        self.ensure_resolved()?;
        let conn = connected(&mut self.connection)?;
        conn.hgetall(&self.key)
            .await?
            .into_iter()
            .map(|(field, raw)| {
                let value: SessionValue = serde_json::from_str(&raw)?;
                Ok((field, value))
            })
            .collect::<Result<HashMap<_, _>, SessionError>>()
    }

    pub async fn has(&mut self, field: &str) -> Result<bool, SessionError> {
        self.ensure_resolved()?;
        let conn = connected(&mut self.connection)?;
        Ok(conn.hexists(&self.key, field).await?)
    }

    /// Remove `field`. Returns true when it was present.
    pub async fn delete(&mut self, field: &str) -> Result<bool, SessionError> {
        self.ensure_resolved()?;
        let conn = connected(&mut self.connection)?;
        Ok(conn.hdel(&self.key, field).await? > 0)
    }

    /// Remove the whole session entry. Returns true when it existed.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub async fn clear(&mut self) -> Result<bool, SessionError> {
        self.ensure_resolved()?;
        let conn = connected(&mut self.connection)?;
        Ok(conn.del(&self.key).await? > 0)
    }

    fn assign_session_id(&mut self, session_id: String) {
        self.key = self.config.storage_key(&session_id);
        self.session_id = session_id;
    }

    fn ensure_resolved(&self) -> Result<(), SessionError> {
        if self.session_id.is_empty() {
            return Err(SessionError::Unresolved);
        }
        Ok(())
    }
}

fn connected(
    connection: &mut Option<Box<dyn SessionConnection>>,
) -> Result<&mut Box<dyn SessionConnection>, SessionError> {
    connection.as_mut().ok_or(SessionError::NoConnection)
}
