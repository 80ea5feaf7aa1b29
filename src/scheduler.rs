//! Optional server-side keep-alive loop.
//!
//! Does what the dashboard monitor does in the browser: ping, log, then wait
//! the configured interval after a success or a short pause after a failure.

use std::time::Duration;

use crate::config::{PING_RETRY_DELAY_SECS, PING_USER_AGENT};
use crate::ping::PingOutcome;
use crate::routes::log_entry;
use crate::state::AppState;

/// Spawn the scheduler if it is enabled and a target is configured.
pub fn spawn_scheduler(state: &AppState) -> Option<tokio::task::JoinHandle<()>> {
    if !state.config.scheduler.enabled {
        return None;
    }

    let Some(target) = state.config.target.url().map(str::to_string) else {
        tracing::warn!("Scheduler enabled but no target URL configured, not starting");
        return None;
    };

    let interval = Duration::from_secs(state.config.target.interval_seconds());
    let state = state.clone();
    tracing::info!(
        url = %target,
        interval_secs = interval.as_secs(),
        "Starting keep-alive scheduler"
    );

    Some(tokio::spawn(async move {
        loop {
            let outcome = run_once(&state, &target).await;
            tokio::time::sleep(next_delay(&outcome, interval)).await;
        }
    }))
}

/// Ping the target once (with retry) and record the result.
pub async fn run_once(state: &AppState, target: &str) -> PingOutcome {
    let outcome = state.pinger.ping_with_retry(target, PING_USER_AGENT).await;

    let entry = log_entry("auto-", target, &outcome, false, None);
    if let Err(e) = state.store.add_ping_log(entry).await {
        tracing::error!(error = %e, "Failed to record scheduled ping");
    }

    tracing::info!(
        success = outcome.success,
        status = outcome.status_code,
        response_time_ms = outcome.response_time,
        "Scheduled ping finished"
    );
    outcome
}

/// Wait the full interval after a success, retry soon after a failure.
pub fn next_delay(outcome: &PingOutcome, interval: Duration) -> Duration {
    if outcome.success {
        interval
    } else {
        Duration::from_secs(PING_RETRY_DELAY_SECS)
    }
}
