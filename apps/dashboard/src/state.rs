use std::sync::Arc;

use crate::config::Config;
use crate::dashboard::controller::DashboardController;
use crate::dashboard::sessions::SessionRegistry;
use crate::feeds::FeedSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub controller: DashboardController,
    /// Open page-load sessions. Each snapshot inside is immutable.
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Config, feeds: Arc<dyn FeedSource>) -> Self {
        let controller = DashboardController::new(&config, feeds);
        let sessions = Arc::new(SessionRegistry::new(config.max_sessions));
        Self {
            config,
            controller,
            sessions,
        }
    }
}
