//! HTTP API route definitions.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::handlers::{self, healthz, metrics_handler, readyz, status, AppState};
use crate::metrics;

/// OpenAPI document for the public endpoints.
#[derive(OpenApi)]
#[openapi(
    info(title = "probe-service", description = "Liveness and readiness probes"),
    paths(handlers::healthz, handlers::readyz, handlers::status),
    components(schemas(handlers::StatusResponse)),
    tags(
        (name = "probes", description = "Orchestrator probe endpoints"),
        (name = "status", description = "Human-facing status")
    )
)]
pub struct ApiDoc;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Probe endpoints
        .route(handlers::PATH_HEALTHZ, get(healthz))
        .route(handlers::PATH_READYZ, get(readyz))
        // Status and scrape endpoints
        .route("/api/v1/status", get(status))
        .route("/metrics", get(metrics_handler))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(track_latency))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn track_latency(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    metrics::record_http_latency(start, &endpoint);
    response
}
