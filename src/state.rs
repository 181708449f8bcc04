use crate::config::Config;
use crate::resources::Resources;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resources: Arc<Resources>,
}

impl AppState {
    pub fn new(config: Config, resources: Arc<Resources>) -> Self {
        Self {
            config: Arc::new(config),
            resources,
        }
    }
}
