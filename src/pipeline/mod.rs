//! Raw catalog payload -> enriched product dataset.
//!
//! Stages run in a fixed order over the whole batch: normalize every item,
//! derive every price change, then classify outliers against fences computed
//! from all derived changes. The pipeline performs no I/O.

pub mod derive;
pub mod normalize;
pub mod outliers;

use serde_json::Value;
use tracing::{debug, info};

use crate::constants::DEFAULT_FENCE_MULTIPLIER;
use crate::error::{Result, ScraperError};
use crate::observability::metrics;
use crate::types::{ProductDataset, ProductRecord, RawItem};

pub use derive::{derive_price_change, PriceChange};
pub use normalize::normalize_item;

/// Pull `results[0].items` out of a search response.
///
/// A missing container is a structural defect and fails the run; an empty
/// `items` array is a valid, empty catalog.
pub fn extract_items(payload: &Value) -> Result<&[RawItem]> {
    let results = payload
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("results"))?;
    let first = results.first().ok_or_else(|| malformed("results[0]"))?;
    first
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| malformed("results[0].items"))
}

fn malformed(path: &str) -> ScraperError {
    ScraperError::MalformedResponse {
        path: path.to_string(),
    }
}

/// Explicitly constructed pipeline; holds no global state.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    fence_multiplier: f64,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            fence_multiplier: DEFAULT_FENCE_MULTIPLIER,
        }
    }

    pub fn with_fence_multiplier(fence_multiplier: f64) -> Self {
        Self { fence_multiplier }
    }

    pub fn fence_multiplier(&self) -> f64 {
        self.fence_multiplier
    }

    /// Run the whole pipeline over a parsed upstream response.
    pub fn run(&self, payload: &Value) -> Result<ProductDataset> {
        let items = extract_items(payload).map_err(|e| {
            metrics::pipeline::malformed_response();
            e
        })?;
        Ok(self.process_items(items))
    }

    /// Normalize, derive and classify an already extracted batch.
    pub fn process_items(&self, items: &[RawItem]) -> ProductDataset {
        let started = std::time::Instant::now();

        let normalized: Vec<_> = items.iter().map(normalize_item).collect();
        let derived: Vec<_> = normalized
            .into_iter()
            .map(|product| {
                let change = derive_price_change(&product);
                (product, change)
            })
            .collect();

        let changes: Vec<f64> = derived.iter().map(|(_, pc)| pc.change).collect();
        let (flags, fences) = outliers::classify(&changes, self.fence_multiplier);
        if let Some(f) = &fences {
            debug!(q1 = f.q1, q3 = f.q3, iqr = f.iqr, lower = f.lower, upper = f.upper, "computed outlier fences");
        }

        let records: Vec<ProductRecord> = derived
            .into_iter()
            .zip(flags)
            .map(|((product, change), is_outlier)| ProductRecord {
                name: product.name,
                current_price: product.current_price,
                previous_price: product.previous_price,
                price_change: change.change,
                price_change_percentage: change.percentage,
                is_outlier,
            })
            .collect();

        let dataset = ProductDataset::new(records, fences);
        info!(
            products = dataset.len(),
            outliers = dataset.outlier_count(),
            "pipeline produced dataset"
        );
        metrics::pipeline::batch_processed(dataset.len(), dataset.outlier_count());
        metrics::pipeline::duration(started.elapsed().as_secs_f64());
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(name: &str, current: f64, previous: f64) -> Value {
        json!({
            "product": {
                "name": name,
                "salesPrice": {
                    "current": { "wholeNumber": current },
                    "previous": { "wholeNumber": previous }
                }
            }
        })
    }

    #[test]
    fn test_extract_items_paths() {
        let ok = json!({ "results": [ { "items": [ {"a": 1} ] } ] });
        assert_eq!(extract_items(&ok).unwrap().len(), 1);

        for (payload, path) in [
            (json!({}), "results"),
            (json!({ "results": {} }), "results"),
            (json!({ "results": [] }), "results[0]"),
            (json!({ "results": [ {} ] }), "results[0].items"),
            (json!({ "results": [ { "items": null } ] }), "results[0].items"),
        ] {
            match extract_items(&payload) {
                Err(ScraperError::MalformedResponse { path: p }) => assert_eq!(p, path),
                other => panic!("expected malformed response, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_process_items_derives_every_field() {
        let items = vec![item("A", 80.0, 100.0), item("B", 50.0, 0.0)];
        let dataset = Pipeline::new().process_items(&items);

        let a = &dataset.records()[0];
        assert_eq!(a.name, "A");
        assert_eq!(a.price_change, 20.0);
        assert_eq!(a.price_change_percentage, 20.0);

        let b = &dataset.records()[1];
        assert_eq!(b.price_change, -50.0);
        assert_eq!(b.price_change_percentage, 0.0);
    }

    #[test]
    fn test_malformed_items_are_kept() {
        let items = vec![json!(null), json!({ "product": { "name": 7 } })];
        let dataset = Pipeline::new().process_items(&items);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[1].name, "7");
    }

    #[test]
    fn test_custom_multiplier_widens_fences() {
        let items: Vec<Value> = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0]
            .iter()
            .map(|c| item("x", 0.0, *c))
            .collect();
        assert_eq!(Pipeline::new().process_items(&items).outlier_count(), 1);
        assert_eq!(Pipeline::with_fence_multiplier(30.0).process_items(&items).outlier_count(), 0);
    }
}
