//! Probe service entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use probe_service::api::{create_router, AppState};
use probe_service::config::Config;
use probe_service::metrics;
use probe_service::readiness::{spawn_warmup, ReadinessState, WarmupGate};
use probe_service::server;
use probe_service::utils::{init_logging, log_filter, shutdown_signal};

/// Liveness and readiness probe service.
#[derive(Parser, Debug)]
#[command(name = "probe-service")]
#[command(about = "Serves /healthz and /readyz for orchestrator probes")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Warm-up delay in milliseconds (overrides WARMUP_DELAY_MS).
    #[arg(long, global = true)]
    warmup_delay_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the probe endpoints (default).
    Run,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Readiness starts false with the process.
    let readiness = Arc::new(ReadinessState::new());

    // Parse CLI arguments
    let args = Args::parse();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(args.port, args.warmup_delay_ms),
        Some(Command::Run) | None => {
            cmd_run(readiness, args.verbose, args.port, args.warmup_delay_ms).await
        }
    }
}

/// Apply CLI overrides on top of the environment configuration.
fn apply_overrides(config: &mut Config, port: Option<u16>, warmup_delay_ms: Option<u64>) {
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(delay) = warmup_delay_ms {
        config.warmup_delay_ms = delay;
    }
}

/// Check configuration validity.
fn cmd_check_config(port_override: Option<u16>, warmup_override: Option<u64>) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("PROBE SERVICE - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let mut config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };
    apply_overrides(&mut config, port_override, warmup_override);

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Listen: {}:{}", config.bind_address, config.port);
    println!("  Warm-up Delay: {}ms", config.warmup_delay_ms);
    match &config.readiness_dependency {
        Some(dep) => println!(
            "  Readiness Dependency: {} (poll every {}ms)",
            dep, config.readiness_poll_interval_ms
        ),
        None => println!("  Readiness Dependency: none (fixed delay)"),
    }
    println!("  /healthz body: {:?}", config.healthy_message);
    println!("  /readyz body: {:?} / {:?}", config.ready_message, config.not_ready_message);
    println!("  Metrics: {}", if config.metrics_enabled { "Enabled" } else { "Disabled" });
    println!("  Log Format: {}", config.log_format);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Serve the probe endpoints until shutdown.
async fn cmd_run(
    readiness: Arc<ReadinessState>,
    verbose: bool,
    port_override: Option<u16>,
    warmup_override: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, port_override, warmup_override);

    init_logging(log_filter(verbose, &config.rust_log), config.log_format);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    let gate = WarmupGate::from_config(&config);
    info!("Warm-up delay: {}ms", config.warmup_delay_ms);
    if let Some(dep) = &config.readiness_dependency {
        info!("Readiness waits for dependency {}", dep);
    }

    // Create app state
    let mut app_state = AppState::new(readiness.clone(), &config);
    if config.metrics_enabled {
        match metrics::install_recorder() {
            Ok(handle) => app_state = app_state.with_prometheus(handle),
            Err(e) => warn!("Metrics disabled: {}", e),
        }
    }

    // Bind before warming up so probes answer 503 during warm-up.
    let addr = config.listen_addr()?;
    let listener = server::bind(addr).await.map_err(|e| {
        error!("{}", e);
        e
    })?;

    let _warmup = spawn_warmup(readiness, gate);

    server::serve(listener, create_router(app_state), shutdown_signal()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_environment_values() {
        let mut config = Config::default();
        apply_overrides(&mut config, Some(9000), Some(250));

        assert_eq!(config.port, 9000);
        assert_eq!(config.warmup_delay_ms, 250);
    }

    #[test]
    fn missing_overrides_keep_environment_values() {
        let mut config = Config {
            port: 7000,
            warmup_delay_ms: 1200,
            ..Config::default()
        };
        apply_overrides(&mut config, None, None);

        assert_eq!(config.port, 7000);
        assert_eq!(config.warmup_delay_ms, 1200);
    }

    #[test]
    fn args_without_subcommand_run_by_default() {
        let args = Args::try_parse_from(["probe-service", "-p", "9000", "--warmup-delay-ms", "10"])
            .unwrap();

        assert!(args.command.is_none());
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.warmup_delay_ms, Some(10));
    }

    #[test]
    fn top_level_flags_apply_to_run_subcommand() {
        let args = Args::try_parse_from(["probe-service", "-p", "9000", "run"]).unwrap();
        assert!(matches!(args.command, Some(Command::Run)));
        assert_eq!(args.port, Some(9000));

        let args = Args::try_parse_from(["probe-service", "run", "--warmup-delay-ms", "0"]).unwrap();
        assert!(matches!(args.command, Some(Command::Run)));
        assert_eq!(args.warmup_delay_ms, Some(0));
    }

    #[test]
    fn args_reject_non_numeric_port() {
        assert!(Args::try_parse_from(["probe-service", "--port", "http"]).is_err());
    }
}
