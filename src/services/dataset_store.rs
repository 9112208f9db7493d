use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;
use crate::models::Dataset;
use crate::services::explorer::Explorer;

/// Uploaded datasets, each with its memoized explorer. Entries idle longer than
/// the configured time, or pushed out by capacity, are forgotten.
pub struct DatasetStore {
    cache: Cache<String, Arc<Explorer>>,
    memo_capacity: usize,
    next_id: AtomicU64,
}

impl DatasetStore {
    pub fn new(capacity: u64, time_to_idle: Duration, memo_capacity: usize) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(time_to_idle)
            .build();
        Self {
            cache,
            memo_capacity,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn insert(&self, dataset: Dataset) -> (String, Arc<Explorer>) {
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = format!("ds_{}_{}", chrono::Utc::now().timestamp(), seq);
        tracing::info!(
            "Storing dataset {} ({} rows x {} columns)",
            id,
            dataset.row_count(),
            dataset.column_count()
        );

        let explorer = Arc::new(Explorer::new(dataset, self.memo_capacity));
        self.cache.insert(id.clone(), Arc::clone(&explorer));
        (id, explorer)
    }

    pub fn get(&self, id: &str) -> Result<Arc<Explorer>, AppError> {
        self.cache.get(id).ok_or_else(|| {
            tracing::warn!("Dataset {} not found", id);
            AppError::NotFound(format!("dataset {}", id))
        })
    }

    pub fn remove(&self, id: &str) -> bool {
        self.cache.remove(id).is_some()
    }
}
