//! HTTP API module for probe, status, and metrics endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, ProbeMessages, StatusResponse};
pub use routes::{create_router, ApiDoc};
