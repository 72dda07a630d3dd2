//! Process-wide readiness signal and the warm-up gate that flips it.
//!
//! Readiness is monotonic: a process starts not-ready, becomes ready exactly
//! once, and never goes back. Orchestrators polling `/readyz` rely on that.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::Serialize;
use strum::Display;
use time::OffsetDateTime;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::metrics;

/// Coarse lifecycle phase reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReadinessPhase {
    /// Warm-up still in progress.
    Starting,
    /// Ready to receive traffic.
    Ready,
}

/// Readiness of this process instance.
#[derive(Debug)]
pub struct ReadinessState {
    started_at: Instant,
    ready: AtomicBool,
    ready_at: OnceLock<OffsetDateTime>,
}

impl ReadinessState {
    /// Create a not-ready state. Call once at process start.
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            ready: AtomicBool::new(false),
            ready_at: OnceLock::new(),
        }
    }

    /// Transition to ready.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn mark_ready(&self) -> bool {
        if self.ready_at.set(OffsetDateTime::now_utc()).is_err() {
            return false;
        }
        self.ready.store(true, Ordering::SeqCst);
        true
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ReadinessPhase {
        if self.is_ready() {
            ReadinessPhase::Ready
        } else {
            ReadinessPhase::Starting
        }
    }

    /// Instant the state was created; the warm-up delay counts from here.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time since the state was created.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Wall-clock time of the transition, if it has happened.
    pub fn ready_since(&self) -> Option<OffsetDateTime> {
        if self.is_ready() {
            self.ready_at.get().copied()
        } else {
            None
        }
    }
}

impl Default for ReadinessState {
    fn default() -> Self {
        Self::new()
    }
}

/// Condition that must hold before the process reports ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarmupGate {
    /// Open after a fixed delay.
    FixedDelay(Duration),
    /// Open after `delay`, once `addr` accepts a TCP connection.
    Dependency {
        /// Initial delay before the first connection attempt.
        delay: Duration,
        /// `host:port` of the downstream dependency.
        addr: String,
        /// Pause between attempts; also bounds each attempt.
        poll_interval: Duration,
    },
}

impl WarmupGate {
    /// Build the gate described by the configuration.
    pub fn from_config(config: &Config) -> Self {
        match &config.readiness_dependency {
            Some(addr) => Self::Dependency {
                delay: config.warmup_delay(),
                addr: addr.clone(),
                poll_interval: config.poll_interval(),
            },
            None => Self::FixedDelay(config.warmup_delay()),
        }
    }

    /// Warm-up delay before the gate can open.
    pub fn delay(&self) -> Duration {
        match self {
            Self::FixedDelay(delay) | Self::Dependency { delay, .. } => *delay,
        }
    }

    /// Wait until the gate opens, counting the delay from `started_at`.
    pub async fn wait(&self, started_at: Instant) {
        sleep_until(started_at + self.delay()).await;

        if let Self::Dependency {
            addr, poll_interval, ..
        } = self
        {
            let mut attempts: u64 = 0;
            loop {
                attempts += 1;
                match timeout(*poll_interval, TcpStream::connect(addr.as_str())).await {
                    Ok(Ok(_)) => {
                        debug!(%addr, attempts, "Readiness dependency reachable");
                        return;
                    }
                    Ok(Err(e)) => debug!(%addr, attempts, "Readiness dependency unreachable: {}", e),
                    Err(_) => debug!(%addr, attempts, "Readiness dependency connect timed out"),
                }
                sleep(*poll_interval).await;
            }
        }
    }
}

/// Spawn the one-shot warm-up task.
///
/// The task waits on `gate`, marks `state` ready and exits. It is never re-armed.
pub fn spawn_warmup(state: Arc<ReadinessState>, gate: WarmupGate) -> JoinHandle<()> {
    metrics::set_ready(false);
    tokio::spawn(async move {
        gate.wait(state.started_at()).await;
        if state.mark_ready() {
            metrics::inc_readiness_transitions();
            metrics::set_ready(true);
            info!(
                uptime_ms = state.uptime().as_millis() as u64,
                "App is ready"
            );
        }
    })
}
