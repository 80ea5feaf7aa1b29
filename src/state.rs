//! Shared application state for request handlers.

use std::sync::Arc;
use tera::Tera;

use crate::config::AppConfig;
use crate::ping::Pinger;
use crate::store::LogStore;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Contains the application configuration, Tera template engine, the ping log
/// store, and the pinger used for outbound requests.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tera: Arc<Tera>,
    pub store: LogStore,
    pub pinger: Pinger,
}

impl AppState {
    pub fn new(config: AppConfig, tera: Tera, pinger: Pinger) -> Self {
        let store = LogStore::new(config.storage.path.clone());
        Self {
            config: Arc::new(config),
            tera: Arc::new(tera),
            store,
            pinger,
        }
    }
}
