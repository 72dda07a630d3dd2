//! Integration tests for the probe service.
//!
//! These bind a real listener on an ephemeral port and talk to it over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use probe_service::api::{create_router, AppState};
use probe_service::config::Config;
use probe_service::readiness::{spawn_warmup, ReadinessState, WarmupGate};
use probe_service::server;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    base_url: String,
    readiness: Arc<ReadinessState>,
    warmup: JoinHandle<()>,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<probe_service::Result<()>>,
}

impl TestServer {
    async fn start(config: Config) -> Self {
        let readiness = Arc::new(ReadinessState::new());
        let state = AppState::new(readiness.clone(), &config);

        let listener = server::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let warmup = spawn_warmup(readiness.clone(), WarmupGate::from_config(&config));

        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(server::serve(listener, create_router(state), async move {
            let _ = rx.await;
        }));

        Self {
            base_url,
            readiness,
            warmup,
            shutdown: Some(tx),
            server,
        }
    }

    async fn get(&self, path: &str) -> (u16, String) {
        let response = reqwest::get(format!("{}{}", self.base_url, path))
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.text().await.unwrap())
    }

    async fn wait_ready(&mut self) {
        tokio::time::timeout(Duration::from_secs(5), &mut self.warmup)
            .await
            .expect("warm-up did not finish")
            .unwrap();
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.server.await.unwrap().unwrap();
    }
}

fn config_with_delay(ms: u64) -> Config {
    Config {
        warmup_delay_ms: ms,
        metrics_enabled: false,
        ..Config::default()
    }
}

/// Liveness answers immediately, readiness after the warm-up delay.
#[tokio::test]
async fn test_probes_over_http() {
    let mut server = TestServer::start(config_with_delay(300)).await;

    assert_eq!(server.get("/healthz").await, (200, "App is healthy".to_string()));
    assert_eq!(server.get("/readyz").await, (503, "App is not ready".to_string()));

    server.wait_ready().await;

    assert!(server.readiness.is_ready());
    for _ in 0..3 {
        assert_eq!(server.get("/readyz").await, (200, "App is ready".to_string()));
    }
    assert_eq!(server.get("/healthz").await, (200, "App is healthy".to_string()));
    server.stop().await;
}

/// A restarted process starts not-ready again.
#[tokio::test]
async fn test_restart_resets_readiness() {
    let mut first = TestServer::start(config_with_delay(0)).await;
    first.wait_ready().await;
    assert_eq!(first.get("/readyz").await.0, 200);
    first.stop().await;

    let second = TestServer::start(config_with_delay(60_000)).await;
    assert_eq!(second.get("/readyz").await.0, 503);
    assert_eq!(second.get("/healthz").await.0, 200);
    second.stop().await;
}

/// Custom bodies are served verbatim.
#[tokio::test]
async fn test_configured_messages() {
    let config = Config {
        healthy_message: "alive".to_string(),
        not_ready_message: "warming up".to_string(),
        ..config_with_delay(60_000)
    };
    let server = TestServer::start(config).await;

    assert_eq!(server.get("/healthz").await, (200, "alive".to_string()));
    assert_eq!(server.get("/readyz").await, (503, "warming up".to_string()));
    server.stop().await;
}

/// Status document reflects the configured delay.
#[tokio::test]
async fn test_status_endpoint() {
    let server = TestServer::start(config_with_delay(60_000)).await;

    let response = reqwest::get(format!("{}/api/v1/status", server.base_url))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["status"], "starting");
    assert_eq!(json["ready"], false);
    assert_eq!(json["warmup_delay_ms"], 60_000);
    server.stop().await;
}
