use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quotaguard::config::QuotaguardConfig;
use quotaguard::http::{AppState, HttpServer};
use quotaguard::ratelimit::{Janitor, RateLimiter};

/// Command-line arguments. Each flag overrides the configuration file and
/// environment.
#[derive(Parser, Debug)]
#[command(name = "quotaguard", version, about = "Marketplace API with per-caller request quotas")]
struct Args {
    /// YAML configuration file
    #[arg(long, short, value_name = "PATH", env = "QUOTAGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen address
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// YAML quota policy file
    #[arg(long, value_name = "PATH")]
    policies: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = QuotaguardConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    if let Some(policies) = args.policies {
        config.rate_limiting.policies_path = Some(policies);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.json = true;
    }

    init_tracing(&config)?;

    info!("Starting Quotaguard");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(listen_addr = %config.server.listen_addr, "Configuration loaded");

    // Initialize the rate limiter
    let rate_limiter = Arc::new(RateLimiter::in_memory(config.policy_table()?));
    let janitor = Janitor::new(
        rate_limiter.store(),
        rate_limiter.clock(),
        config.janitor_interval(),
    )
    .spawn();
    info!("Rate limiter initialized");

    let state = AppState::new(rate_limiter, config.server.user_header.clone());
    let server = HttpServer::new(config.server.listen_addr, state);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    janitor.shutdown().await;
    info!("Quotaguard stopped");
    Ok(())
}

fn init_tracing(config: &QuotaguardConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
