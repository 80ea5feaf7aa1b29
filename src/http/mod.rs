//! HTTP server module.
//!
//! Serves the router over plain HTTP (the usual setup behind a reverse proxy
//! or platform load balancer) or over HTTPS with user-provided certificates.
//!
//! The server includes:
//! - Graceful shutdown on SIGTERM/SIGINT
//! - Certificate hot-reload via SIGHUP (manual TLS mode)

mod server;
mod shutdown;
pub mod static_files;

pub use server::{start_server, ServerError};
