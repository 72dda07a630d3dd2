//! Unified error types for the probe service.
//!
//! The probes themselves never fail: an unready process answers 503, which is
//! a normal protocol response. These variants only cover startup and serving.

use std::net::SocketAddr;

use thiserror::Error;

/// Unified error type for the probe service.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying socket error.
        source: std::io::Error,
    },

    /// Prometheus recorder could not be installed.
    #[error("metrics error: {0}")]
    Metrics(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ProbeError>;
