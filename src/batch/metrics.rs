//! Performance dashboard: four independent sections.

use crate::api::types::{BatchStats, CacheStats, GlobalMetrics, SystemStats};
use crate::api::{ApiResult, Backend};

/// One dashboard section. A failure only affects its own section.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Loaded(T),
    Failed(String),
}

impl<T> Section<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// The failure message, if this section did not load.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Loaded(_) => None,
            Self::Failed(message) => Some(message),
        }
    }

    fn from_result(result: ApiResult<T>) -> Self {
        match result {
            Ok(v) => Self::Loaded(v),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsDashboard {
    pub api: Section<GlobalMetrics>,
    pub batch: Section<BatchStats>,
    pub cache: Section<CacheStats>,
    pub system: Section<SystemStats>,
}

impl MetricsDashboard {
    /// `(task, message)` for every section that failed to load, named after
    /// its endpoint.
    pub fn failures(&self) -> Vec<(&'static str, &str)> {
        [
            ("performance-metrics", self.api.error()),
            ("batch-stats", self.batch.error()),
            ("cache-stats", self.cache.error()),
            ("system-stats", self.system.error()),
        ]
        .into_iter()
        .filter_map(|(task, error)| error.map(|e| (task, e)))
        .collect()
    }

    pub fn failed_sections(&self) -> usize {
        [
            self.api.is_loaded(),
            self.batch.is_loaded(),
            self.cache.is_loaded(),
            self.system.is_loaded(),
        ]
        .iter()
        .filter(|loaded| !**loaded)
        .count()
    }
}

/// Fetch all four sections. Each call is made regardless of the others.
pub fn load_dashboard<B: Backend + ?Sized>(backend: &B) -> MetricsDashboard {
    MetricsDashboard {
        api: Section::from_result(backend.performance_metrics()),
        batch: Section::from_result(backend.batch_stats()),
        cache: Section::from_result(backend.cache_stats()),
        system: Section::from_result(backend.system_stats()),
    }
}
