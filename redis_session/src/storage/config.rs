use std::{env, sync::Arc, sync::LazyLock};

use crate::errors::SessionError;

use super::types::{ConnectionPool, InMemoryConnectionPool, RedisConnectionPool};

pub static SESSION_STORE_TYPE: LazyLock<String> = LazyLock::new(|| {
    env::var("SESSION_STORE_TYPE")
        .ok()
        .unwrap_or("memory".to_string())
});

pub static SESSION_STORE_URL: LazyLock<String> = LazyLock::new(|| {
    env::var("SESSION_STORE_URL")
        .ok()
        .unwrap_or("redis://127.0.0.1:6379".to_string())
});

/// Build the connection pool named by `SESSION_STORE_TYPE` and `SESSION_STORE_URL`.
pub async fn connection_pool_from_env() -> Result<Arc<dyn ConnectionPool>, SessionError> {
    connection_pool(SESSION_STORE_TYPE.as_str(), SESSION_STORE_URL.as_str()).await
}

pub async fn connection_pool(
    store_type: &str,
    store_url: &str,
) -> Result<Arc<dyn ConnectionPool>, SessionError> {
    tracing::info!("Initializing session store with type: {}", store_type);

    let pool: Arc<dyn ConnectionPool> = match store_type {
        "memory" => Arc::new(InMemoryConnectionPool::new()),
        "redis" => {
            let pool = RedisConnectionPool::open(store_url)?;
            pool.init().await.map_err(|e| {
                tracing::error!("Failed to connect to Redis: {}", e);
                SessionError::from(e)
            })?;
            Arc::new(pool)
        }
        t => {
            return Err(SessionError::Config(format!(
                "Unsupported session store type: {t}. Supported types are 'memory' and 'redis'"
            )));
        }
    };

    tracing::info!("Connected to session store: type={}", store_type);
    Ok(pool)
}
