//! HTTP API handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use utoipa::ToSchema;

use crate::config::{
    Config, DEFAULT_HEALTHY_MESSAGE, DEFAULT_NOT_READY_MESSAGE, DEFAULT_READY_MESSAGE,
};
use crate::metrics;
use crate::readiness::{ReadinessPhase, ReadinessState};

/// Liveness route.
pub const PATH_HEALTHZ: &str = "/healthz";
/// Readiness route.
pub const PATH_READYZ: &str = "/readyz";

/// Fixed probe response bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeMessages {
    /// `/healthz` body.
    pub healthy: String,
    /// `/readyz` body when ready.
    pub ready: String,
    /// `/readyz` body when not ready.
    pub not_ready: String,
}

impl ProbeMessages {
    /// Messages configured for this process.
    pub fn from_config(config: &Config) -> Self {
        Self {
            healthy: config.healthy_message.clone(),
            ready: config.ready_message.clone(),
            not_ready: config.not_ready_message.clone(),
        }
    }
}

impl Default for ProbeMessages {
    fn default() -> Self {
        Self {
            healthy: DEFAULT_HEALTHY_MESSAGE.to_string(),
            ready: DEFAULT_READY_MESSAGE.to_string(),
            not_ready: DEFAULT_NOT_READY_MESSAGE.to_string(),
        }
    }
}

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Readiness of this process.
    pub readiness: Arc<ReadinessState>,
    /// Probe response bodies.
    pub messages: Arc<ProbeMessages>,
    /// Configured warm-up delay, reported by the status endpoint.
    pub warmup_delay: Duration,
    /// Prometheus scrape handle, when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state around an existing readiness signal.
    pub fn new(readiness: Arc<ReadinessState>, config: &Config) -> Self {
        Self {
            readiness,
            messages: Arc::new(ProbeMessages::from_config(config)),
            warmup_delay: config.warmup_delay(),
            prometheus: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(ReadinessState::new()), &Config::default())
    }
}

/// Status response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Lifecycle phase: "starting" or "ready".
    #[schema(value_type = String, example = "ready")]
    pub status: ReadinessPhase,
    /// Whether `/readyz` currently answers 200.
    pub ready: bool,
    /// Milliseconds since process start.
    pub uptime_ms: u64,
    /// Configured warm-up delay in milliseconds.
    pub warmup_delay_ms: u64,
    /// RFC 3339 timestamp of the readiness transition.
    pub ready_since: Option<String>,
}

/// Liveness probe - always returns 200.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "probes",
    responses(
        (status = 200, description = "Process is alive.", body = String, content_type = "text/plain")
    )
)]
pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    metrics::inc_probe_requests(PATH_HEALTHZ, StatusCode::OK.as_u16());
    (StatusCode::OK, state.messages.healthy.clone())
}

/// Readiness probe - returns 200 if ready, 503 otherwise.
#[utoipa::path(
    get,
    path = "/readyz",
    tag = "probes",
    responses(
        (status = 200, description = "Warm-up finished.", body = String, content_type = "text/plain"),
        (status = 503, description = "Still warming up.", body = String, content_type = "text/plain")
    )
)]
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let (status, body) = if state.is_ready() {
        (StatusCode::OK, state.messages.ready.clone())
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, state.messages.not_ready.clone())
    };

    metrics::inc_probe_requests(PATH_READYZ, status.as_u16());
    (status, body)
}

/// Status handler - returns readiness details as JSON.
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "status",
    responses(
        (status = 200, description = "Readiness details.", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let readiness = &state.readiness;

    Json(StatusResponse {
        status: readiness.phase(),
        ready: readiness.is_ready(),
        uptime_ms: readiness.uptime().as_millis() as u64,
        warmup_delay_ms: state.warmup_delay.as_millis() as u64,
        ready_since: readiness
            .ready_since()
            .and_then(|at| at.format(&Rfc3339).ok()),
    })
}

/// Prometheus scrape endpoint.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::Response;

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn healthz_ignores_readiness() {
        let state = AppState::default();
        assert!(!state.is_ready());

        let response = healthz(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "App is healthy");
    }

    #[tokio::test]
    async fn readyz_follows_state() {
        let state = AppState::default();

        let response = readyz(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_string(response).await, "App is not ready");

        state.readiness.mark_ready();

        let response = readyz(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "App is ready");
    }

    #[tokio::test]
    async fn readyz_uses_configured_messages() {
        let config = Config {
            ready_message: "up".to_string(),
            not_ready_message: "warming".to_string(),
            ..Config::default()
        };
        let state = AppState::new(Arc::new(ReadinessState::new()), &config);

        let response = readyz(State(state)).await.into_response();
        assert_eq!(body_string(response).await, "warming");
    }

    #[tokio::test]
    async fn status_reports_phase() {
        let state = AppState::default();

        let Json(before) = status(State(state.clone())).await;
        assert_eq!(before.status, ReadinessPhase::Starting);
        assert!(!before.ready);
        assert_eq!(before.warmup_delay_ms, 5000);
        assert!(before.ready_since.is_none());

        state.readiness.mark_ready();

        let Json(after) = status(State(state)).await;
        assert_eq!(after.status, ReadinessPhase::Ready);
        assert!(after.ready);
        assert!(after.ready_since.is_some());
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_not_found() {
        let response = metrics_handler(State(AppState::default()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
