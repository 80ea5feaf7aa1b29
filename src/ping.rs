//! Outbound keep-alive pings.
//!
//! A ping is a single GET to the target. Any HTTP status in `[200, 500)` means
//! the target is up (auth walls and 404s still wake it); 5xx and transport
//! errors are failures. `Pinger::ping_with_retry` retries once after a pause.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{
    PING_RETRY_DELAY_SECS, PING_SUCCESS_MAX_STATUS, PING_SUCCESS_MIN_STATUS, PING_TIMEOUT_SECS,
};

/// Performs the raw GET. Returns the HTTP status or a transport error message.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn get(&self, url: &str, user_agent: &str) -> Result<u16, String>;
}

/// `Prober` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PING_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn get(&self, url: &str, user_agent: &str) -> Result<u16, String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(response.status().as_u16())
    }
}

/// Result of a ping, with or without retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingOutcome {
    pub success: bool,
    /// 0 when no HTTP response was received
    pub status_code: u16,
    pub response_time: u64,
    pub error: Option<String>,
    pub retried: bool,
}

pub fn is_success_status(status: u16) -> bool {
    (PING_SUCCESS_MIN_STATUS..PING_SUCCESS_MAX_STATUS).contains(&status)
}

#[derive(Clone)]
pub struct Pinger {
    prober: Arc<dyn Prober>,
    retry_delay: Duration,
}

impl std::fmt::Debug for Pinger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pinger")
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl Pinger {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self {
            prober,
            retry_delay: Duration::from_secs(PING_RETRY_DELAY_SECS),
        }
    }

    /// Override the pause before the retry attempt.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// One attempt, no retry.
    #[tracing::instrument(name = "ping::once", skip(self, user_agent))]
    pub async fn ping_once(&self, url: &str, user_agent: &str) -> PingOutcome {
        self.attempt(url, user_agent, Instant::now(), false).await
    }

    /// One attempt, and a second one after `retry_delay` if the first failed.
    ///
    /// `response_time` is measured from the start of the first attempt, so a
    /// retried ping includes the pause.
    #[tracing::instrument(name = "ping::with_retry", skip(self, user_agent))]
    pub async fn ping_with_retry(&self, url: &str, user_agent: &str) -> PingOutcome {
        let started = Instant::now();
        let first = self.attempt(url, user_agent, started, false).await;
        if first.success {
            return first;
        }

        tracing::warn!(
            status = first.status_code,
            error = first.error.as_deref().unwrap_or(""),
            delay_secs = self.retry_delay.as_secs(),
            "Ping failed, retrying"
        );
        tokio::time::sleep(self.retry_delay).await;
        self.attempt(url, user_agent, started, true).await
    }

    async fn attempt(&self, url: &str, user_agent: &str, started: Instant, retried: bool) -> PingOutcome {
        let result = self.prober.get(url, user_agent).await;
        let response_time = started.elapsed().as_millis() as u64;

        match result {
            Ok(status) => PingOutcome {
                success: is_success_status(status),
                status_code: status,
                response_time,
                error: None,
                retried,
            },
            Err(error) => PingOutcome {
                success: false,
                status_code: 0,
                response_time,
                error: Some(error),
                retried,
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Prober that replays a fixed script of results and records calls.
    #[derive(Default)]
    pub struct ScriptedProber {
        script: Mutex<VecDeque<Result<u16, String>>>,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedProber {
        pub fn new(script: Vec<Result<u16, String>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn get(&self, url: &str, user_agent: &str) -> Result<u16, String> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), user_agent.to_string()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("script exhausted".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedProber;
    use super::*;
    use crate::config::{PING_USER_AGENT, TEST_PING_USER_AGENT};

    const URL: &str = "https://app.example.com/";

    fn pinger(prober: Arc<ScriptedProber>) -> Pinger {
        Pinger::new(prober).with_retry_delay(Duration::ZERO)
    }

    #[test]
    fn test_success_status_range() {
        assert!(!is_success_status(199));
        assert!(is_success_status(200));
        assert!(is_success_status(301));
        assert!(is_success_status(404));
        assert!(is_success_status(499));
        assert!(!is_success_status(500));
        assert!(!is_success_status(503));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_does_not_retry() {
        let prober = ScriptedProber::new(vec![Ok(200)]);
        let outcome = pinger(prober.clone()).ping_with_retry(URL, PING_USER_AGENT).await;

        assert!(outcome.success);
        assert_eq!(outcome.status_code, 200);
        assert!(!outcome.retried);
        assert_eq!(prober.call_count(), 1);
        assert_eq!(prober.calls.lock().unwrap()[0].1, PING_USER_AGENT);
    }

    #[tokio::test]
    async fn test_failure_then_success_is_retried() {
        let prober = ScriptedProber::new(vec![Ok(502), Ok(200)]);
        let outcome = pinger(prober.clone()).ping_with_retry(URL, PING_USER_AGENT).await;

        assert!(outcome.success);
        assert!(outcome.retried);
        assert_eq!(prober.call_count(), 2);
    }

    #[tokio::test]
    async fn test_retries_only_once() {
        let prober = ScriptedProber::new(vec![
            Err("connection refused".to_string()),
            Err("connection refused".to_string()),
            Ok(200),
        ]);
        let outcome = pinger(prober.clone()).ping_with_retry(URL, PING_USER_AGENT).await;

        assert!(!outcome.success);
        assert!(outcome.retried);
        assert_eq!(outcome.status_code, 0);
        assert_eq!(outcome.error.as_deref(), Some("connection refused"));
        assert_eq!(prober.call_count(), 2);
    }

    #[tokio::test]
    async fn test_ping_once_reports_server_error() {
        let prober = ScriptedProber::new(vec![Ok(503), Ok(200)]);
        let outcome = pinger(prober.clone()).ping_once(URL, TEST_PING_USER_AGENT).await;

        assert!(!outcome.success);
        assert_eq!(outcome.status_code, 503);
        assert_eq!(outcome.error, None);
        assert!(!outcome.retried);
        assert_eq!(prober.call_count(), 1);
    }

    #[tokio::test]
    async fn test_response_time_includes_retry_pause() {
        let prober = ScriptedProber::new(vec![Ok(500), Ok(204)]);
        let pinger = Pinger::new(prober.clone()).with_retry_delay(Duration::from_millis(50));

        let outcome = pinger.ping_with_retry(URL, PING_USER_AGENT).await;
        assert!(outcome.success);
        assert!(outcome.retried);
        assert!(outcome.response_time >= 50);
    }
}
