use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use hyper::Server;
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::chart::render_top_changes_svg;
use crate::constants::{MAX_TOP_CHANGES_LIMIT, TOP_CHANGES_LIMIT};
use crate::error::ScraperError;
use crate::observability::metrics;
use crate::pipeline::Pipeline;
use crate::storage::Storage;
use crate::tasks;
use crate::types::CatalogApi;
use crate::views;

/// Shared handler state. Every request reads one complete snapshot from
/// storage; a refresh swaps the snapshot rather than editing it.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub pipeline: Pipeline,
    /// Source used by `POST /admin/refresh`; `None` disables the endpoint.
    pub api: Option<Arc<dyn CatalogApi>>,
    refresh_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, pipeline: Pipeline, api: Option<Arc<dyn CatalogApi>>) -> Self {
        Self {
            storage,
            pipeline,
            api,
            refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

struct ApiError(StatusCode, String);

impl From<ScraperError> for ApiError {
    fn from(e: ScraperError) -> Self {
        let status = match &e {
            ScraperError::MalformedResponse { .. } | ScraperError::Http(_) | ScraperError::Api { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            error!("Request failed: {}", self.1);
        }
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct TopChangesParams {
    pub limit: Option<usize>,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "price-scraper",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn list_products(State(state): State<AppState>) -> ApiResult<Response> {
    metrics::server::request("products");
    let dataset = state.storage.load_all().await?;
    Ok(Json(views::all(&dataset)).into_response())
}

async fn top_changes(
    State(state): State<AppState>,
    Query(params): Query<TopChangesParams>,
) -> ApiResult<Response> {
    metrics::server::request("top_changes");
    let limit = params.limit.unwrap_or(TOP_CHANGES_LIMIT).min(MAX_TOP_CHANGES_LIMIT);
    let dataset = state.storage.load_all().await?;
    Ok(Json(views::top_changes(&dataset, limit)).into_response())
}

async fn outliers(State(state): State<AppState>) -> ApiResult<Response> {
    metrics::server::request("outliers");
    let dataset = state.storage.load_all().await?;
    Ok(Json(views::outliers(&dataset)).into_response())
}

async fn chart(State(state): State<AppState>) -> ApiResult<Response> {
    metrics::server::request("chart");
    let dataset = state.storage.load_all().await?;
    let svg = render_top_changes_svg(&views::top_changes(&dataset, TOP_CHANGES_LIMIT));
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

async fn latest_run(State(state): State<AppState>) -> ApiResult<Response> {
    metrics::server::request("latest_run");
    match state.storage.latest_run().await? {
        Some(run) => Ok(Json(run).into_response()),
        None => Err(ApiError(StatusCode::NOT_FOUND, "no pipeline run recorded yet".to_string())),
    }
}

async fn metrics_text() -> Response {
    match metrics::render() {
        Some(text) => ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

async fn admin_refresh(State(state): State<AppState>) -> ApiResult<Response> {
    metrics::server::request("admin_refresh");
    let api = state
        .api
        .clone()
        .ok_or_else(|| ApiError(StatusCode::NOT_IMPLEMENTED, "no upstream source configured".to_string()))?;

    // One pipeline run at a time.
    let _guard = state.refresh_lock.try_lock().map_err(|_| {
        warn!("Refresh requested while another is running");
        ApiError(StatusCode::CONFLICT, "a refresh is already running".to_string())
    })?;

    let summary = tasks::refresh(api.as_ref(), &state.pipeline, state.storage.as_ref()).await?;
    Ok(Json(summary).into_response())
}

/// Create the HTTP router with all routes
pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/products", get(list_products))
        .route("/products/top_changes", get(top_changes))
        .route("/products/outliers", get(outliers))
        .route("/products/chart", get(chart))
        .route("/runs/latest", get(latest_run))
        .route("/metrics", get(metrics_text))
        .route("/admin/refresh", post(admin_refresh))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server listening on http://{}", addr);
    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("📦 Products:     http://localhost:{port}/products");
    println!("📈 Top changes:  http://localhost:{port}/products/top_changes");
    println!("🚨 Outliers:     http://localhost:{port}/products/outliers");
    println!("🖼️  Chart:        http://localhost:{port}/products/chart");

    Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}
