//! Configuration loading and constants.
//!
//! Loads application configuration from TOML files and defines constants for
//! ping timeouts and retries, log retention, HTTP cache headers, logging format,
//! and default paths. `AppConfig` is the root configuration struct containing all settings.

use const_format::formatcp;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// HTTP Response Cache Control
// =============================================================================
// API responses and the dashboard reflect live ping state and must never be
// served from an intermediate cache. Static assets only change on upgrade.

/// Static assets (CSS, JS) - long cache
pub const HTTP_CACHE_STATIC_MAX_AGE: u32 = 86400;

pub const CACHE_CONTROL_NO_STORE: &str = "no-store, max-age=0";

pub const CACHE_CONTROL_STATIC: &str = formatcp!("public, max-age={}", HTTP_CACHE_STATIC_MAX_AGE);

// =============================================================================
// Ping Constants
// =============================================================================

/// Timeout for a single outbound GET to the target
pub const PING_TIMEOUT_SECS: u64 = 60;

/// Delay before the single retry of a failed ping
pub const PING_RETRY_DELAY_SECS: u64 = 5;

/// Statuses in `[PING_SUCCESS_MIN_STATUS, PING_SUCCESS_MAX_STATUS)` count as the target being awake
pub const PING_SUCCESS_MIN_STATUS: u16 = 200;
pub const PING_SUCCESS_MAX_STATUS: u16 = 500;

const USER_AGENT_PRODUCT: &str = "Keep-Alive-Monitor/1.0";

/// User-Agent sent for authenticated and scheduled pings
pub const PING_USER_AGENT: &str = USER_AGENT_PRODUCT;

/// User-Agent sent for manual test pings
pub const TEST_PING_USER_AGENT: &str = formatcp!("{} (Test)", USER_AGENT_PRODUCT);

/// Header carrying the shared secret for `/api/ping`
pub const API_KEY_HEADER: &str = "x-api-key";

// =============================================================================
// Store Constants
// =============================================================================

/// Maximum number of ping entries retained in the log
pub const LOG_RETENTION: usize = 50;

/// Number of entries returned by `/api/status` and by default from `/api/logs`
pub const RECENT_LOGS_LIMIT: usize = 10;

// =============================================================================
// Validation Constants
// =============================================================================

/// Default interval between pings (seconds)
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 300;

/// Smallest interval accepted for a configuration
pub const MIN_PING_INTERVAL_SECS: u64 = 60;

/// Minimum length of an API key
pub const MIN_API_KEY_LENGTH: usize = 10;

/// Number of API key characters left visible when masking
pub const API_KEY_VISIBLE_PREFIX: usize = 4;

// =============================================================================
// Dashboard Constants
// =============================================================================

/// How often the dashboard refreshes `/api/status` (milliseconds)
pub const DASHBOARD_STATUS_REFRESH_MS: u64 = 30_000;

/// Number of rows kept in the dashboard's in-browser monitor history
pub const DASHBOARD_HISTORY_ROWS: usize = 30;

// Time unit constants (in seconds) for timeago filter
pub const SECONDS_PER_MINUTE: i64 = 60;
pub const SECONDS_PER_HOUR: i64 = 3600;
pub const SECONDS_PER_DAY: i64 = 86400;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default location of the volatile ping log
pub const DEFAULT_STORAGE_PATH: &str = "/tmp/keep-alive-data.json";

/// Default template directory
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// Default static asset directory
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "keepalive_monitor=debug,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Default site title
pub const DEFAULT_SITE_NAME: &str = "Keep-Alive Monitor";

/// Graceful shutdown drain period (seconds)
pub const SHUTDOWN_GRACE_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub http: HttpServerConfig,
    /// The service being kept awake
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub ui: UiConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// File this configuration was loaded from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub tls: TlsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain HTTP, usually behind a reverse proxy
    #[default]
    None,
    /// User-provided certificate and key files
    Manual,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub mode: TlsMode,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Target service settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetConfig {
    /// URL fetched on every ping
    pub url: Option<String>,
    /// Shared secret expected in the X-Api-Key header of `/api/ping`
    pub api_key: Option<String>,
    /// Interval between pings in seconds (default: 300)
    pub interval_seconds: Option<u64>,
}

impl TargetConfig {
    /// Configured URL, treating an empty string as unset
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Configured API key, treating an empty string as unset
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Get effective interval (configured or default)
    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds.unwrap_or(DEFAULT_PING_INTERVAL_SECS)
    }

    /// Both the target URL and the API key are present
    pub fn is_configured(&self) -> bool {
        self.url().is_some() && self.api_key().is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the ping log (default: /tmp/keep-alive-data.json)
    #[serde(default = "StorageConfig::default_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

impl StorageConfig {
    fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_STORAGE_PATH)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchedulerConfig {
    /// Ping the target from the server itself, without an external cron
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    /// Site title shown in the dashboard header and page title
    #[serde(default = "UiConfig::default_site_name")]
    pub site_name: String,
    #[serde(default = "UiConfig::default_templates_dir")]
    pub templates_dir: String,
    #[serde(default = "UiConfig::default_static_dir")]
    pub static_dir: String,
    /// Version string, populated at runtime
    #[serde(skip_deserializing, default = "UiConfig::default_version")]
    pub version: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            site_name: Self::default_site_name(),
            templates_dir: Self::default_templates_dir(),
            static_dir: Self::default_static_dir(),
            version: Self::default_version(),
        }
    }
}

impl UiConfig {
    fn default_site_name() -> String {
        DEFAULT_SITE_NAME.to_string()
    }

    fn default_templates_dir() -> String {
        DEFAULT_TEMPLATES_DIR.to_string()
    }

    fn default_static_dir() -> String {
        DEFAULT_STATIC_DIR.to_string()
    }

    fn default_version() -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    /// Glob matching every template file
    pub fn template_glob(&self) -> String {
        format!("{}/**/*", self.templates_dir.trim_end_matches('/'))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_toml(&contents)?;
        config.source = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    /// Path shown to operators when telling them where to put settings
    pub fn source_display(&self) -> String {
        self.source
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH))
            .display()
            .to_string()
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.tls.mode == TlsMode::Manual
            && (self.http.tls.cert_path.is_none() || self.http.tls.key_path.is_none())
        {
            return Err(ConfigError::Validation(
                "http.tls.mode = \"manual\" requires cert_path and key_path".to_string(),
            ));
        }

        if let Some(interval) = self.target.interval_seconds {
            if interval < MIN_PING_INTERVAL_SECS {
                return Err(ConfigError::Validation(format!(
                    "target.interval_seconds must be >= {}",
                    MIN_PING_INTERVAL_SECS
                )));
            }
        }

        match self.logging.format.to_ascii_lowercase().as_str() {
            "text" | "json" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "logging.format must be \"text\" or \"json\", got \"{}\"",
                    other
                )))
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[http]
host = "127.0.0.1"
port = 3000
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.http.port, 3000);
        assert_eq!(config.http.tls.mode, TlsMode::None);
        assert_eq!(config.storage.path, PathBuf::from(DEFAULT_STORAGE_PATH));
        assert_eq!(config.target.interval_seconds(), DEFAULT_PING_INTERVAL_SECS);
        assert!(!config.target.is_configured());
        assert!(!config.scheduler.enabled);
        assert_eq!(config.ui.site_name, DEFAULT_SITE_NAME);
        assert_eq!(config.ui.version, env!("CARGO_PKG_VERSION"));
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_target_section() {
        let toml = format!(
            "{}\n[target]\nurl = \"https://app.example.com\"\napi_key = \"0123456789abc\"\ninterval_seconds = 600\n",
            MINIMAL
        );
        let config = AppConfig::from_toml(&toml).unwrap();
        assert_eq!(config.target.url(), Some("https://app.example.com"));
        assert_eq!(config.target.interval_seconds(), 600);
        assert!(config.target.is_configured());
    }

    #[test]
    fn test_empty_strings_are_unset() {
        let toml = format!("{}\n[target]\nurl = \"\"\napi_key = \"\"\n", MINIMAL);
        let config = AppConfig::from_toml(&toml).unwrap();
        assert_eq!(config.target.url(), None);
        assert_eq!(config.target.api_key(), None);
        assert!(!config.target.is_configured());
    }

    #[test]
    fn test_interval_below_minimum_rejected() {
        let toml = format!("{}\n[target]\ninterval_seconds = 30\n", MINIMAL);
        let err = AppConfig::from_toml(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_manual_tls_requires_paths() {
        let toml = r#"
[http]
host = "0.0.0.0"
port = 443

[http.tls]
mode = "manual"
cert_path = "/etc/keepalive/cert.pem"
"#;
        let err = AppConfig::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("cert_path and key_path"));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let toml = format!("{}\n[logging]\nformat = \"xml\"\n", MINIMAL);
        assert!(AppConfig::from_toml(&toml).is_err());
    }

    #[test]
    fn test_load_records_source_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keepalive.toml");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert_eq!(config.source_display(), path.display().to_string());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/keepalive.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_template_glob_trims_trailing_slash() {
        let ui = UiConfig {
            templates_dir: "/usr/share/keepalive/templates/".to_string(),
            ..UiConfig::default()
        };
        assert_eq!(ui.template_glob(), "/usr/share/keepalive/templates/**/*");
    }
}
