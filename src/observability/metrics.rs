//! Metrics for the price scraper, named with Prometheus conventions.
//!
//! Recording functions are grouped by phase. Without an installed recorder
//! every call is a no-op, so tests and library callers need no setup.

use std::fmt;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Upstream metrics
    UpstreamRequestsSuccess,
    UpstreamRequestsError,
    UpstreamRequestDuration,
    UpstreamPayloadBytes,

    // Pipeline metrics
    PipelineRunsTotal,
    PipelineMalformedResponses,
    PipelineProductsProcessed,
    PipelineOutliersFlagged,
    PipelineDuration,

    // Storage metrics
    StorageSavesSuccess,
    StorageSavesError,
    StorageLoads,

    // Server metrics
    ServerRequests,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::UpstreamRequestsSuccess => "price_scraper_upstream_requests_success_total",
            MetricName::UpstreamRequestsError => "price_scraper_upstream_requests_error_total",
            MetricName::UpstreamRequestDuration => "price_scraper_upstream_request_duration_seconds",
            MetricName::UpstreamPayloadBytes => "price_scraper_upstream_payload_bytes",

            MetricName::PipelineRunsTotal => "price_scraper_pipeline_runs_total",
            MetricName::PipelineMalformedResponses => "price_scraper_pipeline_malformed_responses_total",
            MetricName::PipelineProductsProcessed => "price_scraper_pipeline_products_processed_total",
            MetricName::PipelineOutliersFlagged => "price_scraper_pipeline_outliers_flagged_total",
            MetricName::PipelineDuration => "price_scraper_pipeline_duration_seconds",

            MetricName::StorageSavesSuccess => "price_scraper_storage_saves_success_total",
            MetricName::StorageSavesError => "price_scraper_storage_saves_error_total",
            MetricName::StorageLoads => "price_scraper_storage_loads_total",

            MetricName::ServerRequests => "price_scraper_server_requests_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it twice is harmless.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Prometheus text exposition, if the recorder is installed.
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod upstream {
    use super::MetricName;

    pub fn request_success(api: &str, duration_secs: f64, bytes: usize) {
        ::metrics::counter!(MetricName::UpstreamRequestsSuccess.as_str(), "api" => api.to_string()).increment(1);
        ::metrics::histogram!(MetricName::UpstreamRequestDuration.as_str()).record(duration_secs);
        ::metrics::histogram!(MetricName::UpstreamPayloadBytes.as_str()).record(bytes as f64);
    }

    pub fn request_error(api: &str) {
        ::metrics::counter!(MetricName::UpstreamRequestsError.as_str(), "api" => api.to_string()).increment(1);
    }
}

pub mod pipeline {
    use super::MetricName;

    pub fn batch_processed(products: usize, outliers: usize) {
        ::metrics::counter!(MetricName::PipelineRunsTotal.as_str()).increment(1);
        ::metrics::counter!(MetricName::PipelineProductsProcessed.as_str()).increment(products as u64);
        ::metrics::counter!(MetricName::PipelineOutliersFlagged.as_str()).increment(outliers as u64);
    }

    pub fn malformed_response() {
        ::metrics::counter!(MetricName::PipelineMalformedResponses.as_str()).increment(1);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::PipelineDuration.as_str()).record(secs);
    }
}

pub mod storage {
    use super::MetricName;

    pub fn save_success(backend: &'static str) {
        ::metrics::counter!(MetricName::StorageSavesSuccess.as_str(), "backend" => backend).increment(1);
    }

    pub fn save_error(backend: &'static str) {
        ::metrics::counter!(MetricName::StorageSavesError.as_str(), "backend" => backend).increment(1);
    }

    pub fn load(backend: &'static str) {
        ::metrics::counter!(MetricName::StorageLoads.as_str(), "backend" => backend).increment(1);
    }
}

pub mod server {
    use super::MetricName;

    pub fn request(route: &'static str) {
        ::metrics::counter!(MetricName::ServerRequests.as_str(), "route" => route).increment(1);
    }
}
