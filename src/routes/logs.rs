//! Ping log access.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use super::require_api_key;
use crate::config::{LOG_RETENTION, RECENT_LOGS_LIMIT};
use crate::error::{AppError, AppErrorResponse, ResultExt};
use crate::middleware::RequestId;
use crate::state::AppState;
use crate::store::PingLogEntry;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

impl LogsQuery {
    fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(RECENT_LOGS_LIMIT)
            .clamp(1, LOG_RETENTION)
    }
}

/// `GET /api/logs?limit=N`: most recent entries, newest first.
#[instrument(name = "api::logs::list", skip(state, request_id, query))]
pub async fn list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<Vec<PingLogEntry>>, AppErrorResponse> {
    let Query(query) = query
        .map_err(|rejection| AppError::InvalidQuery(rejection.body_text()))
        .with_request_id(&request_id)?;
    Ok(Json(state.store.recent_logs(query.effective_limit()).await))
}

/// `DELETE /api/logs`: wipe the log and counters. Requires X-Api-Key.
#[instrument(name = "api::logs::clear", skip(state, request_id, headers))]
pub async fn clear(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppErrorResponse> {
    require_api_key(&state, &headers).with_request_id(&request_id)?;
    state.store.clear().await.with_request_id(&request_id)?;

    Ok(Json(json!({
        "success": true,
        "message": "Ping log cleared",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit() {
        assert_eq!(LogsQuery { limit: None }.effective_limit(), RECENT_LOGS_LIMIT);
        assert_eq!(LogsQuery { limit: Some(0) }.effective_limit(), 1);
        assert_eq!(LogsQuery { limit: Some(25) }.effective_limit(), 25);
        assert_eq!(LogsQuery { limit: Some(500) }.effective_limit(), LOG_RETENTION);
    }
}
