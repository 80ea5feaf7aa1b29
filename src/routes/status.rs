//! System status and statistics for the dashboard.

use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::instrument;

use crate::config::RECENT_LOGS_LIMIT;
use crate::state::AppState;
use crate::store::{PingLogEntry, StatsSummary};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusConfig {
    /// Scheme and host only; the path may carry secrets
    pub target_url: Option<String>,
    pub interval: u64,
    pub is_configured: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub configured: bool,
    pub config: StatusConfig,
    pub stats: StatsSummary,
    pub recent_logs: Vec<PingLogEntry>,
    pub server_time: String,
}

/// Reduce `https://host/some/path?token=x` to `https://host/***`.
///
/// Anything that is not an http(s) URL with a host is returned unchanged.
pub fn mask_target_url(url: &str) -> String {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    let Some(rest) = rest else {
        return url.to_string();
    };

    let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    if authority_len == 0 {
        return url.to_string();
    }

    let scheme_len = url.len() - rest.len();
    format!("{}/***", &url[..scheme_len + authority_len])
}

/// Assemble the status document shared by `/api/status` and the dashboard.
pub async fn build_status(state: &AppState) -> StatusResponse {
    let target = &state.config.target;
    let configured = target.is_configured();

    let stats = state.store.stats().await;
    let recent_logs = state.store.recent_logs(RECENT_LOGS_LIMIT).await;

    StatusResponse {
        configured,
        config: StatusConfig {
            target_url: target.url().map(mask_target_url),
            interval: target.interval_seconds(),
            is_configured: configured,
        },
        stats,
        recent_logs,
        server_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// `GET /api/status`
#[instrument(name = "api::status", skip(state))]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(build_status(&state).await)
}
