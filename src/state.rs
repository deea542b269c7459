use crate::config::AppConfig;
use crate::domain::Directory;
use crate::metrics::Metrics;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub directory: Arc<Directory>,
    pub metrics: Arc<Metrics>,
}
