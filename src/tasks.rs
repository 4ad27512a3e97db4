use std::sync::Arc;

use tracing::{error, info, info_span, Instrument};

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::storage::{RunSummary, Storage};
use crate::types::CatalogApi;

/// Fetch one catalog page, run the pipeline over it and persist the snapshot.
///
/// A malformed upstream response fails the run and leaves the stored snapshot
/// untouched.
pub async fn refresh(api: &dyn CatalogApi, pipeline: &Pipeline, storage: &dyn Storage) -> Result<RunSummary> {
    let span = info_span!("refresh", api = api.api_name(), backend = storage.backend_name());
    async move {
        let payload = api.fetch_payload().await?;
        let dataset = match pipeline.run(&payload) {
            Ok(dataset) => dataset,
            Err(e) => {
                error!("Pipeline rejected upstream payload: {}", e);
                return Err(e);
            }
        };

        let summary = storage.save(Arc::new(dataset)).await?;
        info!(
            run_id = %summary.run_id,
            products = summary.product_count,
            outliers = summary.outlier_count,
            "Refresh complete"
        );
        Ok(summary)
    }
    .instrument(span)
    .await
}
