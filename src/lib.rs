//! Keep-alive monitor.
//!
//! Pings a configured URL so a hosted service that sleeps when idle stays
//! awake, records every attempt in a small volatile JSON log, and serves a
//! dashboard plus a JSON API for cron services and the browser.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod ping;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod templates;
pub mod validation;

pub use config::AppConfig;
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
