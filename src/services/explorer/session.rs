use lru::LruCache;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::chart::{ChartProjection, ChartProjector, ChartRequest};
use super::classifier::ColumnClassifier;
use super::quality::QualityScorer;
use super::stats::{column_statistics, ColumnStatistics};
use super::table::{SortState, TablePage, TableView};
use super::types::{ColumnProfile, QualityReport};
use crate::models::Dataset;

/// Derived views of one dataset, each computed on first use and reused while the
/// inputs that produced it are unchanged. A new dataset gets a new `Explorer`.
pub struct Explorer {
    dataset: Arc<Dataset>,
    profiles: OnceCell<Vec<ColumnProfile>>,
    quality: OnceCell<QualityReport>,
    statistics: OnceCell<Vec<ColumnStatistics>>,
    sort_orders: Mutex<LruCache<SortState, Arc<Vec<usize>>>>,
    charts: Mutex<LruCache<ChartRequest, Arc<ChartProjection>>>,
}

impl Explorer {
    pub fn new(dataset: Dataset, memo_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(memo_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            dataset: Arc::new(dataset),
            profiles: OnceCell::new(),
            quality: OnceCell::new(),
            statistics: OnceCell::new(),
            sort_orders: Mutex::new(LruCache::new(capacity)),
            charts: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn profiles(&self) -> &[ColumnProfile] {
        self.profiles
            .get_or_init(|| ColumnClassifier.classify(&self.dataset))
    }

    pub fn quality(&self) -> &QualityReport {
        self.quality
            .get_or_init(|| QualityScorer.score(&self.dataset, self.profiles()))
    }

    pub fn statistics(&self) -> &[ColumnStatistics] {
        self.statistics
            .get_or_init(|| column_statistics(&self.dataset, self.profiles()))
    }

    pub fn page(&self, sort: &SortState, page_index: usize) -> TablePage<'_> {
        let order = self.sorted_order(sort);
        TableView::page_from_order(&self.dataset, &order, sort, page_index)
    }

    pub fn chart(&self, request: &ChartRequest) -> Arc<ChartProjection> {
        if let Some(hit) = self.charts.lock().get(request).cloned() {
            return hit;
        }
        let projection = Arc::new(ChartProjector::render(&self.dataset, self.profiles(), request));
        self.charts.lock().put(request.clone(), Arc::clone(&projection));
        projection
    }

    fn sorted_order(&self, sort: &SortState) -> Arc<Vec<usize>> {
        if let Some(hit) = self.sort_orders.lock().get(sort).cloned() {
            return hit;
        }
        let order = Arc::new(TableView::sorted_order(&self.dataset, sort));
        self.sort_orders.lock().put(sort.clone(), Arc::clone(&order));
        order
    }
}
