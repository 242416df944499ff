pub mod handlers;
pub mod routes;

pub use routes::create_router;

use crate::config::Config;
use crate::prometheus::MetricsSource;
use std::sync::Arc;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn MetricsSource>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(source: Arc<dyn MetricsSource>, config: Config) -> Self {
        Self {
            source,
            config: Arc::new(config),
        }
    }
}
