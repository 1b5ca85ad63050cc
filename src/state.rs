use std::sync::Arc;

use crate::config::AppConfig;
use crate::external::price_provider::PriceProvider;
use crate::services::session_store::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub price_provider: Arc<dyn PriceProvider>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: AppConfig, price_provider: Arc<dyn PriceProvider>) -> Self {
        let sessions = SessionStore::new(config.session_ttl, config.status_log_capacity);
        Self {
            config: Arc::new(config),
            price_provider,
            sessions,
        }
    }
}
