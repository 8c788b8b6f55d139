mod error;
mod handlers;
mod server;

use axum::routing::{Router, get, post};
use std::sync::Arc;

use redis_session::{SessionConfig, connection_pool_from_env};

use handlers::{AppState, delete_field, get_field, index, logout, put_field, show_session};
use server::{init_tracing, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("demo-session");

    let state = AppState {
        pool: connection_pool_from_env().await?,
        config: Arc::new(SessionConfig::from_env()),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/session", get(show_session))
        .route(
            "/session/{field}",
            get(get_field).put(put_field).delete(delete_field),
        )
        .route("/logout", post(logout))
        .with_state(state);

    let addr = std::env::var("DEMO_ADDR").unwrap_or("0.0.0.0:3001".to_string());
    tracing::info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
