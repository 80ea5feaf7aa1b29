//! Authenticated keep-alive ping, called by an external cron service.

use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::Serialize;
use tracing::instrument;

use super::{log_entry, record_ping, require_api_key};
use crate::config::PING_USER_AGENT;
use crate::error::{AppError, AppErrorResponse, ResultExt};
use crate::middleware::{ClientIp, RequestId};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub success: bool,
    pub timestamp: String,
    pub target: String,
    pub status_code: u16,
    pub response_time: u64,
    pub message: &'static str,
    pub error: Option<String>,
    pub retried: bool,
}

/// `GET /api/ping`: requires X-Api-Key, pings with one retry and logs the result.
#[instrument(name = "api::ping", skip(state, request_id, client_ip, headers))]
pub async fn ping(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    client_ip: ClientIp,
    headers: HeaderMap,
) -> Result<Json<PingResponse>, AppErrorResponse> {
    require_api_key(&state, &headers).with_request_id(&request_id)?;

    let target = state
        .config
        .target
        .url()
        .ok_or(AppError::TargetNotConfigured)
        .with_request_id(&request_id)?
        .to_string();

    let outcome = state.pinger.ping_with_retry(&target, PING_USER_AGENT).await;
    let entry = log_entry("", &target, &outcome, false, client_ip.0);
    let timestamp = entry.timestamp.clone();
    record_ping(&state, entry).await;

    tracing::info!(
        success = outcome.success,
        status = outcome.status_code,
        response_time_ms = outcome.response_time,
        retried = outcome.retried,
        "Keep-alive ping finished"
    );

    Ok(Json(PingResponse {
        success: outcome.success,
        timestamp,
        target,
        status_code: outcome.status_code,
        response_time: outcome.response_time,
        message: if outcome.success {
            "Ping successful"
        } else {
            "Ping failed"
        },
        error: outcome.error,
        retried: outcome.retried,
    }))
}
