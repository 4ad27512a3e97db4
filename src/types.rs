use serde::{Deserialize, Serialize};

/// One catalog item exactly as the upstream search API returned it.
pub type RawItem = serde_json::Value;

/// A catalog item flattened to the fields the pipeline works with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    pub name: String,
    pub current_price: f64,
    pub previous_price: f64,
}

/// A fully derived product row.
///
/// `is_outlier` depends on the batch the record was classified in; the same
/// prices can be flagged differently in a different batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub current_price: f64,
    pub previous_price: f64,
    pub price_change: f64,
    pub price_change_percentage: f64,
    pub is_outlier: bool,
}

/// Quartiles and Tukey fences computed over one batch of price changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierFences {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierFences {
    /// Strictly below the lower fence or strictly above the upper one.
    /// NaN fences flag nothing.
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// One immutable snapshot produced by a single pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDataset {
    records: Vec<ProductRecord>,
    /// `None` only for an empty batch.
    fences: Option<OutlierFences>,
}

impl ProductDataset {
    pub(crate) fn new(records: Vec<ProductRecord>, fences: Option<OutlierFences>) -> Self {
        Self { records, fences }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn fences(&self) -> Option<&OutlierFences> {
        self.fences.as_ref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn outlier_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_outlier).count()
    }
}

/// A source of raw catalog search responses.
#[async_trait::async_trait]
pub trait CatalogApi: Send + Sync {
    /// Unique identifier for this data source
    fn api_name(&self) -> &'static str;

    /// Fetch one page window and return the parsed response body.
    async fn fetch_payload(&self) -> crate::error::Result<serde_json::Value>;
}
