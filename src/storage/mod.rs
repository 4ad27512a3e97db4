//! Persistence boundary for product snapshots.
//!
//! The pipeline never depends on a concrete backend. Each `save` replaces the
//! stored snapshot wholesale; readers always get one complete snapshot.

pub mod in_memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::Result;
use crate::types::ProductDataset;

pub use in_memory::InMemoryStorage;
pub use sqlite::SqliteStorage;

/// Bookkeeping for one persisted pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub product_count: usize,
    pub outlier_count: usize,
    /// Hex SHA-256 of the serialized records.
    pub fingerprint: String,
}

impl RunSummary {
    pub fn for_dataset(dataset: &ProductDataset) -> Result<Self> {
        Ok(Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            product_count: dataset.len(),
            outlier_count: dataset.outlier_count(),
            fingerprint: fingerprint(dataset)?,
        })
    }
}

/// Content hash of a dataset's records. Equal datasets hash equally.
pub fn fingerprint(dataset: &ProductDataset) -> Result<String> {
    let bytes = serde_json::to_vec(dataset.records())?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Storage trait for persisting product snapshots
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend label used in logs and metrics.
    fn backend_name(&self) -> &'static str;

    /// Replace the stored snapshot with `dataset` and record the run.
    async fn save(&self, dataset: Arc<ProductDataset>) -> Result<RunSummary>;

    /// The current snapshot; empty if nothing was saved yet.
    async fn load_all(&self) -> Result<Arc<ProductDataset>>;

    async fn latest_run(&self) -> Result<Option<RunSummary>>;
}
