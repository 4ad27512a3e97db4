use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::{RunSummary, Storage};
use crate::error::{Result, ScraperError};
use crate::observability::metrics;
use crate::types::ProductDataset;

const BACKEND: &str = "in_memory";

/// In-memory storage implementation for development/testing
pub struct InMemoryStorage {
    snapshot: RwLock<Arc<ProductDataset>>,
    runs: Mutex<Vec<RunSummary>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(ProductDataset::empty())),
            runs: Mutex::new(Vec::new()),
        }
    }

    pub fn run_count(&self) -> Result<usize> {
        Ok(self.runs.lock().map_err(poisoned)?.len())
    }
}

fn poisoned<T>(_: T) -> ScraperError {
    ScraperError::Storage("in-memory storage lock poisoned".to_string())
}

#[async_trait]
impl Storage for InMemoryStorage {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn save(&self, dataset: Arc<ProductDataset>) -> Result<RunSummary> {
        let summary = RunSummary::for_dataset(&dataset)?;

        *self.snapshot.write().map_err(poisoned)? = dataset;
        self.runs.lock().map_err(poisoned)?.push(summary.clone());

        debug!("Saved snapshot with {} products as run {}", summary.product_count, summary.run_id);
        metrics::storage::save_success(BACKEND);
        Ok(summary)
    }

    async fn load_all(&self) -> Result<Arc<ProductDataset>> {
        metrics::storage::load(BACKEND);
        Ok(self.snapshot.read().map_err(poisoned)?.clone())
    }

    async fn latest_run(&self) -> Result<Option<RunSummary>> {
        Ok(self.runs.lock().map_err(poisoned)?.last().cloned())
    }
}
