use std::time::Duration;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

use services::dataset_store::DatasetStore;

// Application state
pub struct AppState {
    pub config: config::Config,
    pub store: DatasetStore,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        let store = DatasetStore::new(
            config.dataset_cache_capacity,
            Duration::from_secs(config.dataset_idle_secs),
            config.memo_capacity,
        );
        Self { config, store }
    }
}
