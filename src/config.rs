//! Application configuration loaded from environment variables.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;
use strum::{Display, EnumString};

use crate::error::{ProbeError, Result};

/// Observed liveness body.
pub const DEFAULT_HEALTHY_MESSAGE: &str = "App is healthy";
/// Observed readiness body once warmed up.
pub const DEFAULT_READY_MESSAGE: &str = "App is ready";
/// Observed readiness body during warm-up.
pub const DEFAULT_NOT_READY_MESSAGE: &str = "App is not ready";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP server port for the probe endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address to bind the listener on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    // === Readiness ===
    /// Delay after process start before the app reports ready.
    #[serde(default = "default_warmup_delay_ms")]
    pub warmup_delay_ms: u64,

    /// Optional `host:port` that must accept TCP connections before the
    /// app reports ready. Checked only after the warm-up delay.
    #[serde(default)]
    pub readiness_dependency: Option<String>,

    /// Interval between dependency connection attempts.
    #[serde(default = "default_poll_interval_ms")]
    pub readiness_poll_interval_ms: u64,

    // === Response Bodies ===
    /// Body returned by `/healthz`.
    #[serde(default = "default_healthy_message")]
    pub healthy_message: String,

    /// Body returned by `/readyz` once ready.
    #[serde(default = "default_ready_message")]
    pub ready_message: String,

    /// Body returned by `/readyz` during warm-up.
    #[serde(default = "default_not_ready_message")]
    pub not_ready_message: String,

    // === Observability ===
    /// Install the Prometheus recorder and serve `/metrics`.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_warmup_delay_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_healthy_message() -> String {
    DEFAULT_HEALTHY_MESSAGE.to_string()
}

fn default_ready_message() -> String {
    DEFAULT_READY_MESSAGE.to_string()
}

fn default_not_ready_message() -> String {
    DEFAULT_NOT_READY_MESSAGE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            warmup_delay_ms: default_warmup_delay_ms(),
            readiness_dependency: None,
            readiness_poll_interval_ms: default_poll_interval_ms(),
            healthy_message: default_healthy_message(),
            ready_message: default_ready_message(),
            not_ready_message: default_not_ready_message(),
            metrics_enabled: default_true(),
            rust_log: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_pairs(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(pairs)?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.parse::<IpAddr>().is_err() {
            return Err(ProbeError::InvalidConfig(format!(
                "BIND_ADDRESS must be an IP address, got {:?}",
                self.bind_address
            )));
        }

        if self.readiness_poll_interval_ms == 0 {
            return Err(ProbeError::InvalidConfig(
                "READINESS_POLL_INTERVAL_MS must be greater than 0".to_string(),
            ));
        }

        if let Some(dependency) = &self.readiness_dependency {
            let valid = dependency
                .rsplit_once(':')
                .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
            if !valid {
                return Err(ProbeError::InvalidConfig(format!(
                    "READINESS_DEPENDENCY must be host:port, got {:?}",
                    dependency
                )));
            }
        }

        for (name, value) in [
            ("HEALTHY_MESSAGE", &self.healthy_message),
            ("READY_MESSAGE", &self.ready_message),
            ("NOT_READY_MESSAGE", &self.not_ready_message),
        ] {
            if value.is_empty() {
                return Err(ProbeError::InvalidConfig(format!("{} must not be empty", name)));
            }
        }

        Ok(())
    }

    /// Socket address to listen on. Call after [`Config::validate`].
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            ProbeError::InvalidConfig(format!("invalid BIND_ADDRESS {:?}", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Warm-up delay as a [`Duration`].
    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms)
    }

    /// Dependency poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_interval_ms)
    }
}
