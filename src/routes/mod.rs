//! HTTP route handlers.
//!
//! The JSON API lives under `/api`, the dashboard at `/`. Everything that
//! reflects ping state is served with `no-store`; static assets get a long
//! Cache-Control lifetime.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod config;
pub mod health;
pub mod home;
pub mod logs;
pub mod ping;
pub mod status;
pub mod test_ping;

use axum::{
    http::{
        header::{HeaderValue, CACHE_CONTROL},
        HeaderMap,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use chrono::{SecondsFormat, Utc};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{API_KEY_HEADER, CACHE_CONTROL_NO_STORE, CACHE_CONTROL_STATIC};
use crate::error::{AppError, AppErrorResponse};
use crate::http::static_files::create_static_service;
use crate::middleware::{request_id_layer, RequestId};
use crate::ping::PingOutcome;
use crate::state::AppState;
use crate::store::PingLogEntry;

/// Check the X-Api-Key header against the configured key.
///
/// Both must be present; a server without a key rejects every caller.
pub fn require_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let received = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    match (received, state.config.target.api_key()) {
        (Some(received), Some(expected)) if received == expected => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

/// Build a log entry for a ping that just finished.
pub fn log_entry(
    id_prefix: &str,
    target: &str,
    outcome: &PingOutcome,
    is_test: bool,
    ip: Option<String>,
) -> PingLogEntry {
    let now = Utc::now();
    PingLogEntry {
        id: format!("{}{}", id_prefix, now.timestamp_millis()),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        target: target.to_string(),
        success: outcome.success,
        status_code: outcome.status_code,
        response_time: outcome.response_time,
        error: outcome.error.clone(),
        retried: outcome.retried,
        is_test,
        ip,
    }
}

/// Record a ping. The ping already happened, so a storage failure is logged
/// rather than turned into an error response.
pub async fn record_ping(state: &AppState, entry: PingLogEntry) {
    if let Err(e) = state.store.add_ping_log(entry).await {
        tracing::error!(error = %e, "Failed to record ping");
    }
}

fn method_not_allowed(allowed: &'static str, request_id: &RequestId) -> Response {
    AppErrorResponse {
        error: AppError::MethodNotAllowed(allowed),
        request_id: Some(request_id.clone()),
    }
    .into_response()
}

async fn only_get(Extension(request_id): Extension<RequestId>) -> Response {
    method_not_allowed("GET method is", &request_id)
}

async fn only_get_post(Extension(request_id): Extension<RequestId>) -> Response {
    method_not_allowed("GET and POST methods are", &request_id)
}

async fn only_get_delete(Extension(request_id): Extension<RequestId>) -> Response {
    method_not_allowed("GET and DELETE methods are", &request_id)
}

/// Creates the Axum router with all routes and cache headers.
pub fn create_router(state: AppState) -> Router {
    // API - live state, never cached
    let api_routes = Router::new()
        .route("/api/ping", get(ping::ping).fallback(only_get))
        .route("/api/test", get(test_ping::run).fallback(only_get))
        .route("/api/status", get(status::status).fallback(only_get))
        .route(
            "/api/config",
            get(config::instructions)
                .post(config::validate)
                .fallback(only_get_post),
        )
        .route(
            "/api/logs",
            get(logs::list).delete(logs::clear).fallback(only_get_delete),
        );

    // Dashboard - rendered from current state
    let home_routes = Router::new().route("/", get(home::index));

    let dynamic_routes = Router::new()
        .merge(api_routes)
        .merge(home_routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_STORE),
        ));

    // Static files - long cache
    let static_routes = Router::new()
        .nest_service("/static", create_static_service(&state.config.ui))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_STATIC),
        ));

    // Health check - no caching, always fresh for liveness probes
    let health_routes = Router::new().route("/health", get(health::health));

    Router::new()
        .merge(dynamic_routes)
        .merge(health_routes)
        .merge(static_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
