//! redis_session - Cookie-addressed HTTP sessions stored as Redis hashes
//!
//! Each visitor gets a random alphanumeric session id, sent to the browser in a
//! cookie and used to address a hash in the store (`SESSION:<id>` by default).
//! [`SessionHandler`] resolves the id at the start of a request, keeps the
//! entry's time-to-live fresh, and exposes field-level get/set/has/delete/clear.

mod config;
mod cookie;
mod errors;
mod handler;
mod storage;
mod utils;

#[cfg(test)]
mod test_utils;

pub use config::{
    DEFAULT_COOKIE_NAME, DEFAULT_KEY_PREFIX, DEFAULT_MAX_LIFETIME, DEFAULT_SESSION_ID_LENGTH,
    MAX_SECONDS, SessionConfig,
};
pub use cookie::{RequestCookies, ResponseCookies, SessionCookie};
pub use errors::SessionError;
pub use handler::{SessionHandler, SessionValue};
pub use storage::{
    ConnectionPool, InMemoryConnection, InMemoryConnectionPool, RedisConnection,
    RedisConnectionPool, SESSION_STORE_TYPE, SESSION_STORE_URL, SessionConnection, StorageError,
    connection_pool, connection_pool_from_env,
};
pub use utils::{AlphanumericIdGenerator, IdGenerator, UtilError, gen_random_alphanumeric};
