//! Volatile JSON-file ping log.
//!
//! The whole record (last ping, capped log, counters) is read, modified and
//! written back on every ping. The file lives in a temporary location by
//! default and may disappear on restart; a missing or unreadable file is
//! treated as an empty log.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::LOG_RETENTION;

/// A single recorded ping attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingLogEntry {
    pub id: String,
    /// RFC 3339 UTC timestamp
    pub timestamp: String,
    pub target: String,
    pub success: bool,
    /// HTTP status of the last attempt, 0 when no response was received
    pub status_code: u16,
    /// Milliseconds from the start of the first attempt
    pub response_time: u64,
    pub error: Option<String>,
    #[serde(default)]
    pub retried: bool,
    #[serde(default)]
    pub is_test: bool,
    #[serde(default)]
    pub ip: Option<String>,
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingCounters {
    pub total_pings: u64,
    pub successful_pings: u64,
    pub failed_pings: u64,
}

/// The persisted record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredData {
    pub last_ping: Option<PingLogEntry>,
    #[serde(default)]
    pub logs: Vec<PingLogEntry>,
    #[serde(default)]
    pub stats: PingCounters,
}

impl StoredData {
    /// Prepend an entry, enforce retention and update counters.
    fn record(&mut self, entry: PingLogEntry) {
        self.stats.total_pings += 1;
        if entry.success {
            self.stats.successful_pings += 1;
        } else {
            self.stats.failed_pings += 1;
        }

        self.logs.insert(0, entry.clone());
        self.logs.truncate(LOG_RETENTION);
        self.last_ping = Some(entry);
    }
}

/// Counters plus derived success rate, as served by `/api/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    #[serde(flatten)]
    pub counters: PingCounters,
    /// Percentage rounded to two decimals
    pub success_rate: f64,
    pub last_ping: Option<PingLogEntry>,
}

impl From<StoredData> for StatsSummary {
    fn from(data: StoredData) -> Self {
        Self {
            success_rate: success_rate(&data.stats),
            counters: data.stats,
            last_ping: data.last_ping,
        }
    }
}

/// Successful / total as a percentage with two decimals; 0 when nothing was pinged.
pub fn success_rate(counters: &PingCounters) -> f64 {
    if counters.total_pings == 0 {
        return 0.0;
    }
    let rate = counters.successful_pings as f64 / counters.total_pings as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write ping log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove ping log {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode ping log: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Handle to the JSON log file. Cheap to clone; clones share one write lock.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored record, falling back to defaults.
    pub async fn read(&self) -> StoredData {
        let contents = match tokio::fs::read_to_string(self.path.as_path()).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return StoredData::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read ping log");
                return StoredData::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ping log is corrupt, starting fresh");
                StoredData::default()
            }
        }
    }

    /// Persist the whole record.
    pub async fn write(&self, data: &StoredData) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(data)?;

        // Write next to the target and rename so readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| StoreError::Write {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, self.path.as_path())
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.to_path_buf(),
                source,
            })
    }

    /// Append a ping to the log and return the updated record.
    pub async fn add_ping_log(&self, entry: PingLogEntry) -> Result<StoredData, StoreError> {
        let _guard = self.lock.lock().await;

        let mut data = self.read().await;
        data.record(entry);
        self.write(&data).await?;

        tracing::debug!(
            total = data.stats.total_pings,
            entries = data.logs.len(),
            "Ping log updated"
        );
        Ok(data)
    }

    /// Counters, success rate and last ping.
    pub async fn stats(&self) -> StatsSummary {
        self.read().await.into()
    }

    /// The `limit` most recent entries, newest first.
    pub async fn recent_logs(&self, limit: usize) -> Vec<PingLogEntry> {
        let mut logs = self.read().await.logs;
        logs.truncate(limit);
        logs
    }

    /// Delete the log file. A missing file is not an error.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;

        match tokio::fs::remove_file(self.path.as_path()).await {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Ping log cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove {
                path: self.path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: usize, success: bool) -> PingLogEntry {
        PingLogEntry {
            id: id.to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            target: "https://app.example.com".to_string(),
            success,
            status_code: if success { 200 } else { 503 },
            response_time: 120,
            error: None,
            retried: !success,
            is_test: false,
            ip: Some("203.0.113.7".to_string()),
        }
    }

    fn temp_store() -> (tempfile::TempDir, LogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("keep-alive-data.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_read_missing_file_returns_defaults() {
        let (_dir, store) = temp_store();
        assert_eq!(store.read().await, StoredData::default());
    }

    #[tokio::test]
    async fn test_read_corrupt_file_returns_defaults() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "{ not json").unwrap();
        assert_eq!(store.read().await, StoredData::default());
    }

    #[tokio::test]
    async fn test_add_ping_log_updates_counters_and_last_ping() {
        let (_dir, store) = temp_store();
        store.add_ping_log(entry(1, true)).await.unwrap();
        let data = store.add_ping_log(entry(2, false)).await.unwrap();

        assert_eq!(data.stats.total_pings, 2);
        assert_eq!(data.stats.successful_pings, 1);
        assert_eq!(data.stats.failed_pings, 1);
        assert_eq!(data.last_ping.as_ref().map(|e| e.id.as_str()), Some("2"));
        assert_eq!(data.logs[0].id, "2");
        assert_eq!(data.logs[1].id, "1");

        // Persisted, not just returned
        assert_eq!(store.read().await, data);
    }

    #[tokio::test]
    async fn test_log_is_capped_newest_first() {
        let (_dir, store) = temp_store();
        for i in 0..(LOG_RETENTION + 5) {
            store.add_ping_log(entry(i, true)).await.unwrap();
        }

        let data = store.read().await;
        assert_eq!(data.logs.len(), LOG_RETENTION);
        assert_eq!(data.logs[0].id, (LOG_RETENTION + 4).to_string());
        assert_eq!(data.logs[LOG_RETENTION - 1].id, "5");
        // Counters are not capped
        assert_eq!(data.stats.total_pings, (LOG_RETENTION + 5) as u64);
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_not_lost() {
        let (_dir, store) = temp_store();
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add_ping_log(entry(i, i % 2 == 0)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = store.read().await.stats;
        assert_eq!(stats.total_pings, 20);
        assert_eq!(stats.successful_pings + stats.failed_pings, 20);
    }

    #[tokio::test]
    async fn test_stats_summary() {
        let (_dir, store) = temp_store();
        let empty = store.stats().await;
        assert_eq!(empty.success_rate, 0.0);
        assert!(empty.last_ping.is_none());

        store.add_ping_log(entry(1, true)).await.unwrap();
        store.add_ping_log(entry(2, false)).await.unwrap();
        store.add_ping_log(entry(3, true)).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.counters.total_pings, 3);
        assert_eq!(stats.success_rate, 66.67);
        assert_eq!(stats.last_ping.map(|e| e.id), Some("3".to_string()));
    }

    #[tokio::test]
    async fn test_recent_logs_limit() {
        let (_dir, store) = temp_store();
        for i in 0..15 {
            store.add_ping_log(entry(i, true)).await.unwrap();
        }
        let recent = store.recent_logs(10).await;
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, "14");
    }

    #[tokio::test]
    async fn test_clear_removes_file_and_tolerates_missing() {
        let (_dir, store) = temp_store();
        store.add_ping_log(entry(1, true)).await.unwrap();
        assert!(store.path().exists());

        store.clear().await.unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.read().await, StoredData::default());

        store.clear().await.unwrap();
    }

    #[test]
    fn test_success_rate_rounding() {
        let counters = PingCounters {
            total_pings: 3,
            successful_pings: 2,
            failed_pings: 1,
        };
        assert_eq!(success_rate(&counters), 66.67);
        assert_eq!(success_rate(&PingCounters::default()), 0.0);
    }

    #[test]
    fn test_reads_camel_case_file_format() {
        let json = r#"{
  "lastPing": null,
  "logs": [],
  "stats": { "totalPings": 4, "successfulPings": 3, "failedPings": 1 }
}"#;
        let data: StoredData = serde_json::from_str(json).unwrap();
        assert_eq!(data.stats.total_pings, 4);

        let summary = StatsSummary::from(data);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["totalPings"], 4);
        assert_eq!(value["successRate"], 75.0);
        assert!(value["lastPing"].is_null());
    }
}
