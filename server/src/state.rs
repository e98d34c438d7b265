use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::catalog::Catalog;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    /// Directory holding the built client bundle.
    pub dist_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    geometry_requests_total: AtomicU64,
    geometry_not_modified_total: AtomicU64,
    distance_requests_total: AtomicU64,
    distance_not_found_total: AtomicU64,
    distance_bad_requests_total: AtomicU64,
    distance_read_errors_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ObservabilitySnapshot {
    pub geometry_requests_total: u64,
    pub geometry_not_modified_total: u64,
    pub distance_requests_total: u64,
    pub distance_not_found_total: u64,
    pub distance_bad_requests_total: u64,
    pub distance_read_errors_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            geometry_requests_total: self.geometry_requests_total.load(Ordering::Relaxed),
            geometry_not_modified_total: self.geometry_not_modified_total.load(Ordering::Relaxed),
            distance_requests_total: self.distance_requests_total.load(Ordering::Relaxed),
            distance_not_found_total: self.distance_not_found_total.load(Ordering::Relaxed),
            distance_bad_requests_total: self.distance_bad_requests_total.load(Ordering::Relaxed),
            distance_read_errors_total: self.distance_read_errors_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_geometry_request(&self) {
        self.geometry_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_geometry_not_modified(&self) {
        self.geometry_not_modified_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_distance_request(&self) {
        self.distance_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_distance_not_found(&self) {
        self.distance_not_found_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_distance_bad_request(&self) {
        self.distance_bad_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_distance_read_error(&self) {
        self.distance_read_errors_total
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(catalog: Catalog, dist_dir: PathBuf) -> Self {
        Self {
            catalog: Arc::new(catalog),
            dist_dir,
            started_at: Utc::now(),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}
