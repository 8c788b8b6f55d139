mod config;
mod errors;
mod memory;
mod redis;
mod types;

pub use config::{
    SESSION_STORE_TYPE, SESSION_STORE_URL, connection_pool, connection_pool_from_env,
};
pub use errors::StorageError;
pub use types::{
    ConnectionPool, InMemoryConnection, InMemoryConnectionPool, RedisConnection,
    RedisConnectionPool, SessionConnection,
};
