//! Manual test ping triggered from the dashboard. No API key, no retry.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use super::{log_entry, record_ping};
use crate::config::TEST_PING_USER_AGENT;
use crate::middleware::{ClientIp, RequestId};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPingResponse {
    pub success: bool,
    pub timestamp: String,
    pub target: String,
    pub status_code: u16,
    pub response_time: u64,
    pub message: &'static str,
    pub error: Option<String>,
    pub note: &'static str,
}

/// `GET /api/test`
#[instrument(name = "api::test", skip(state, request_id, client_ip))]
pub async fn run(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    client_ip: ClientIp,
) -> Response {
    let Some(target) = state.config.target.url().map(str::to_string) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Not Configured",
                "message": "Target URL not configured. Set [target] url in the configuration file.",
                "configured": false,
                "requestId": request_id.0.to_string(),
            })),
        )
            .into_response();
    };

    let outcome = state.pinger.ping_once(&target, TEST_PING_USER_AGENT).await;
    let entry = log_entry("test-", &target, &outcome, true, client_ip.0);
    let timestamp = entry.timestamp.clone();
    record_ping(&state, entry).await;

    tracing::info!(
        success = outcome.success,
        status = outcome.status_code,
        response_time_ms = outcome.response_time,
        "Test ping finished"
    );

    Json(TestPingResponse {
        success: outcome.success,
        timestamp,
        target,
        status_code: outcome.status_code,
        response_time: outcome.response_time,
        message: if outcome.success {
            "Test ping successful ✓"
        } else {
            "Test ping failed ✗"
        },
        error: outcome.error,
        note: "This was a manual test ping",
    })
    .into_response()
}
