//! Dashboard page.
//!
//! Renders the current status server-side; the page script then refreshes it
//! from `/api/status` and runs the in-browser monitor loop.

use axum::{extract::State, response::Html, Extension};
use tracing::instrument;

use super::status::build_status;
use crate::config::{
    DASHBOARD_HISTORY_ROWS, DASHBOARD_STATUS_REFRESH_MS, PING_RETRY_DELAY_SECS,
};
use crate::error::{AppError, AppErrorResponse, ResultExt};
use crate::middleware::RequestId;
use crate::state::AppState;

/// Dashboard handler.
#[instrument(name = "home::index", skip(state, request_id))]
pub async fn index(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Html<String>, AppErrorResponse> {
    let status = build_status(&state).await;

    let mut context = tera::Context::new();
    context.insert("config", &state.config.ui);
    context.insert("status", &status);
    context.insert("status_refresh_ms", &DASHBOARD_STATUS_REFRESH_MS);
    context.insert("history_rows", &DASHBOARD_HISTORY_ROWS);
    context.insert("retry_delay_ms", &(PING_RETRY_DELAY_SECS * 1000));
    context.insert("scheduler_enabled", &state.config.scheduler.enabled);

    let html = state
        .tera
        .render("index.html", &context)
        .map_err(AppError::from)
        .with_request_id(&request_id)?;
    Ok(Html(html))
}
