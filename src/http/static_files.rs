//! Static asset serving for the dashboard.

use tower_http::services::ServeDir;

use crate::config::UiConfig;

/// Serve CSS and JS from the configured static directory.
pub fn create_static_service(ui: &UiConfig) -> ServeDir {
    ServeDir::new(&ui.static_dir)
}
