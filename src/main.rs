//! Keep-alive monitor: keeps an idling hosted service awake.
//!
//! This is the application entry point. It initializes tracing, loads configuration
//! from a TOML file, builds the pinger and templates, optionally starts the
//! server-side scheduler, sets up the Axum router and starts the HTTP server.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keepalive_monitor::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use keepalive_monitor::http::start_server;
use keepalive_monitor::ping::{HttpProber, Pinger};
use keepalive_monitor::routes::create_router;
use keepalive_monitor::scheduler::spawn_scheduler;
use keepalive_monitor::state::AppState;
use keepalive_monitor::templates::init_templates;

/// Keep-alive monitor: pings a hosted service so it never idles
#[derive(Parser, Debug)]
#[command(name = "keepalive-monitor", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "keepalive_monitor=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration first so the log format can be honoured
    let config = AppConfig::load(&args.config)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(path = %args.config, "Loaded configuration");

    match config.target.url() {
        Some(url) => tracing::info!(
            url = %url,
            api_key_configured = config.target.api_key().is_some(),
            interval_secs = config.target.interval_seconds(),
            "Target configured"
        ),
        None => tracing::warn!("No target URL configured; /api/ping and /api/test will refuse to run"),
    }

    let tera = init_templates(&config.ui.template_glob())?;
    tracing::info!("Initialized templates");

    let pinger = Pinger::new(Arc::new(HttpProber::new()?));

    let state = AppState::new(config.clone(), tera, pinger);
    tracing::info!(path = %state.store.path().display(), "Using ping log");

    spawn_scheduler(&state);

    let app = create_router(state);
    start_server(app, &config).await?;

    Ok(())
}
