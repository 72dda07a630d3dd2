//! Liveness and readiness probes for orchestrated deployments.
//!
//! The service answers two probe routes polled by an orchestrator such as
//! Kubernetes:
//!
//! ```text
//! GET /healthz  -> 200 "App is healthy"        (always)
//! GET /readyz   -> 503 "App is not ready"      (during warm-up)
//!               -> 200 "App is ready"          (afterwards, forever)
//! ```
//!
//! Readiness flips exactly once, after a configurable warm-up delay and,
//! optionally, once a downstream TCP dependency accepts connections.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`readiness`]: Readiness state and the warm-up gate
//! - [`api`]: HTTP handlers, router, OpenAPI document
//! - [`server`]: Listener binding and serving
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Logging and shutdown helpers

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod readiness;
pub mod server;
pub mod utils;

pub use config::Config;
pub use error::{ProbeError, Result};
pub use readiness::{spawn_warmup, ReadinessState, WarmupGate};
