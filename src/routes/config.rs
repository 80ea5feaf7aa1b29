//! Configuration instructions and proposal validation.
//!
//! Settings are read from the TOML file at startup, so this endpoint never
//! changes anything: it reports what is configured and checks what the
//! operator is about to configure.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::instrument;

use crate::config::DEFAULT_PING_INTERVAL_SECS;
use crate::state::AppState;
use crate::validation::{validate_proposal, ConfigProposal};

const CRON_JOB_SETTINGS_URL: &str = "https://console.cron-job.org/settings";

/// `GET /api/config`: current settings (without secrets) and setup steps.
#[instrument(name = "api::config::instructions", skip(state))]
pub async fn instructions(State(state): State<AppState>) -> Json<Value> {
    let target = &state.config.target;
    let config_file = state.config.source_display();

    let interval = match target.interval_seconds {
        Some(seconds) => seconds.to_string(),
        None => format!("{} (default)", DEFAULT_PING_INTERVAL_SECS),
    };

    Json(json!({
        "message": "Configuration instructions",
        "currentConfig": {
            "targetUrl": target.url().unwrap_or("Not configured"),
            "apiKeyConfigured": target.api_key().is_some(),
            "interval": interval,
        },
        "instructions": {
            "step1": {
                "title": "Edit the configuration file",
                "path": config_file,
                "section": "[target]",
                "variables": {
                    "url": "URL of the site to keep alive (e.g., https://your-site.onrender.com)",
                    "api_key": "Your cron-job.org API Key",
                    "interval_seconds": format!("Interval in seconds (optional, default: {})", DEFAULT_PING_INTERVAL_SECS),
                },
            },
            "step2": {
                "title": "Get your cron-job.org API Key",
                "url": CRON_JOB_SETTINGS_URL,
                "instructions": "Login → Settings → API → Copy API Key",
            },
            "step3": {
                "title": "Restart the service",
                "instructions": "Configuration is read at startup; restart after editing the file for changes to take effect",
            },
        },
    }))
}

/// `POST /api/config`: validate a proposed configuration.
#[instrument(name = "api::config::validate", skip(state, body))]
pub async fn validate(
    State(state): State<AppState>,
    body: Result<Json<ConfigProposal>, JsonRejection>,
) -> Response {
    let proposal = match body {
        Ok(Json(proposal)) => proposal,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected config proposal body");
            return validation_failed(vec![format!(
                "request body must be a JSON object: {}",
                rejection.body_text()
            )]);
        }
    };

    let valid = match validate_proposal(&proposal) {
        Ok(valid) => valid,
        Err(errors) => {
            tracing::info!(errors = errors.len(), "Config proposal rejected");
            return validation_failed(errors);
        }
    };

    let config_file = state.config.source_display();
    let interval_step = match valid.interval {
        Some(interval) => format!("4. Set interval_seconds = {}", interval),
        None => format!(
            "4. interval_seconds is optional (default: {})",
            DEFAULT_PING_INTERVAL_SECS
        ),
    };

    Json(json!({
        "success": true,
        "message": "Configuration is valid",
        "nextSteps": [
            format!("1. Open {} and go to the [target] section", config_file),
            format!("2. Set url = \"{}\"", valid.target_url),
            format!("3. Set api_key = \"{}\" (your full API key)", valid.masked_api_key()),
            interval_step,
            "5. Restart the service".to_string(),
            "6. Come back here to verify configuration".to_string(),
        ],
        "configFile": config_file,
    }))
    .into_response()
}

fn validation_failed(errors: Vec<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "errors": errors,
            "message": "Validation failed",
        })),
    )
        .into_response()
}
