use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::error::{InsightError, InsightResult};
use crate::models::Dataset;

/// Holds at most one dataset; each upload replaces it wholesale.
#[derive(Debug, Default)]
pub struct DatasetStore {
    current: RwLock<Option<Arc<Dataset>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current dataset, returning the one it displaced.
    pub fn set(&self, dataset: Dataset) -> Option<Arc<Dataset>> {
        let next = Arc::new(dataset);
        let mut guard = self.current.write().unwrap_or_else(|poisoned| {
            warn!("dataset store write lock was poisoned, recovering");
            poisoned.into_inner()
        });
        guard.replace(next)
    }

    pub fn get(&self) -> Option<Arc<Dataset>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| {
                warn!("dataset store read lock was poisoned, recovering");
                poisoned.into_inner()
            })
            .clone()
    }

    pub fn require(&self) -> InsightResult<Arc<Dataset>> {
        self.get().ok_or(InsightError::NoData)
    }

    pub fn is_loaded(&self) -> bool {
        self.get().is_some()
    }
}
