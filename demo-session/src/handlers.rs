use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;

use redis_session::{ConnectionPool, SessionConfig, SessionHandler};

use crate::error::IntoResponseError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pool: Arc<dyn ConnectionPool>,
    pub(crate) config: Arc<SessionConfig>,
}

type HandlerResult<T> = Result<T, (StatusCode, String)>;

/// Connect a handler and resolve the session of this request.
async fn open_session(state: &AppState, headers: &HeaderMap) -> HandlerResult<SessionHandler> {
    let mut session = SessionHandler::new(state.config.clone(), Some(state.pool.clone()));
    session.initialize().await.into_response_error()?;
    session.before_request(headers).await.into_response_error()?;
    Ok(session)
}

pub(crate) async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HandlerResult<(HeaderMap, String)> {
    let mut session = open_session(&state, &headers).await?;
    let visits = session
        .get_as::<u64>("visits")
        .await
        .into_response_error()?
        .unwrap_or(0)
        + 1;

    let mut response = HeaderMap::new();
    if !session
        .set("visits", &visits, &mut response)
        .await
        .into_response_error()?
    {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Session store rejected the write".to_string(),
        ));
    }

    Ok((
        response,
        format!("Visit {} of session {}\n", visits, session.session_id()),
    ))
}

pub(crate) async fn show_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HandlerResult<Json<Value>> {
    let mut session = open_session(&state, &headers).await?;
    let fields = session.get_all().await.into_response_error()?;
    Ok(Json(json!({
        "session_id": session.session_id(),
        "fields": fields,
    })))
}

pub(crate) async fn get_field(
    State(state): State<AppState>,
    Path(field): Path<String>,
    headers: HeaderMap,
) -> HandlerResult<Json<Value>> {
    let mut session = open_session(&state, &headers).await?;
    match session.get(&field).await.into_response_error()? {
        Some(value) => Ok(Json(value)),
        None => Err((StatusCode::NOT_FOUND, format!("No field {field}"))),
    }
}

pub(crate) async fn put_field(
    State(state): State<AppState>,
    Path(field): Path<String>,
    headers: HeaderMap,
    Json(value): Json<Value>,
) -> HandlerResult<(StatusCode, HeaderMap)> {
    let mut session = open_session(&state, &headers).await?;
    let mut response = HeaderMap::new();
    if session
        .set(&field, &value, &mut response)
        .await
        .into_response_error()?
    {
        Ok((StatusCode::NO_CONTENT, response))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Session store rejected the write".to_string(),
        ))
    }
}

pub(crate) async fn delete_field(
    State(state): State<AppState>,
    Path(field): Path<String>,
    headers: HeaderMap,
) -> HandlerResult<StatusCode> {
    let mut session = open_session(&state, &headers).await?;
    if session.delete(&field).await.into_response_error()? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("No field {field}")))
    }
}

pub(crate) async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HandlerResult<StatusCode> {
    let mut session = open_session(&state, &headers).await?;
    let existed = session.clear().await.into_response_error()?;
    tracing::debug!("Cleared session {}: existed={}", session.session_id(), existed);
    Ok(StatusCode::NO_CONTENT)
}
