//! Main entry point for the Duo Ladder tracker
//!
//! This is the production entry point that initializes and runs the
//! tracker with proper error handling, logging, and graceful shutdown.

use anyhow::Result;
use clap::Parser;
use duo_ladder::config::{validate_config, AppConfig};
use duo_ladder::service::{AppState, HealthCheck, HealthStatus, ServiceHandle};
use std::path::PathBuf;
use tokio::signal;
use tokio::time::Duration;
use tracing::{error, info, warn};

/// Duo Ladder - ranked carry/noob duo challenge tracker
#[derive(Parser)]
#[command(
    name = "duo-ladder",
    version,
    about = "Tracks ranked carry/noob duos and scores the matches they play together",
    long_about = "Duo Ladder polls the match-history API for every registered pair, discovers \
                 games the two played together in the tracked queue, scores them with rank \
                 fairness, streak and performance bonuses, and keeps a running leaderboard."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Roster override
    #[arg(long, value_name = "FILE", help = "Override the roster of tracked pairs")]
    roster: Option<PathBuf>,

    /// API key override
    #[arg(long, value_name = "KEY", help = "Override the Riot API key")]
    api_key: Option<String>,

    /// Health port override
    #[arg(long, value_name = "PORT", help = "Override health/metrics server port")]
    health_port: Option<u16>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and roster and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Log a health summary periodically
async fn health_check_task(handle: ServiceHandle) {
    let mut interval = tokio::time::interval(Duration::from_secs(300));

    while handle.is_running().await {
        interval.tick().await;

        match HealthCheck::check(&handle).await {
            Ok(health) => {
                info!(
                    "Health check: {} - {} pairs, {} matches scored, polling every {:.1}s",
                    health.status,
                    health.stats.store.tracked_pairs,
                    health.stats.store.matches_scored,
                    health.stats.poll_interval_seconds
                );
                if health.status != HealthStatus::Healthy {
                    for check in health.checks.iter().filter(|c| c.message.is_some()) {
                        warn!("  {}: {:?}", check.name, check.message);
                    }
                }
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
            }
        }
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🚀 Duo Ladder Tracker");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Health port: {}", config.service.health_port);
    info!(
        "   Riot routing: {} / {}",
        config.riot.platform, config.riot.region
    );
    info!("   Queue: {}", config.tracking.queue_id);
    match config.tracking.event_start {
        Some(start) => info!("   Event start: {}", start),
        None => info!("   Event start: (none)"),
    }
    info!(
        "   Base poll interval: {}s",
        config.tracking.base_poll_interval_seconds
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from file, environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(roster) = &args.roster {
        config.tracking.roster_path = Some(roster.clone());
    }

    if let Some(api_key) = &args.api_key {
        config.riot.api_key = api_key.clone();
    }

    if let Some(health_port) = args.health_port {
        config.service.health_port = health_port;
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        display_startup_banner(&config);
        let store = match AppState::load_store(&config) {
            Ok(store) => store,
            Err(e) => {
                error!("Roster validation failed: {}", e);
                std::process::exit(1);
            }
        };
        let stats = store.stats();
        info!(
            "Configuration validation successful - {} players, {} pairs",
            stats.players, stats.tracked_pairs
        );
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    info!("Initializing service components...");
    let mut app_state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting service...");
    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    let health_task = tokio::spawn(health_check_task(app_state.handle()));

    info!("✅ Duo Ladder Tracker is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("🛑 Shutdown signal received, beginning graceful shutdown...");
    health_task.abort();

    let shutdown_timeout = config.shutdown_timeout() + Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, app_state.shutdown()).await {
        Ok(Ok(())) => info!("✅ Graceful shutdown completed successfully"),
        Ok(Err(e)) => error!("Shutdown failed: {}", e),
        Err(_) => warn!("⚠️  Shutdown timeout exceeded, forcing exit"),
    }

    info!("🛑 Duo Ladder Tracker stopped");
    Ok(())
}
