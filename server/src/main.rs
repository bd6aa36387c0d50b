//! Keygate license server
//!
//! Issues license keys to administrators and verifies keys presented by
//! client applications.
//!
//! Usage:
//!   keygate-server --port 8000 --database license_system.db --admin-token <TOKEN>

use std::{net::SocketAddr, sync::Arc, time::Duration};
use anyhow::{Context, Result};
use clap::Parser;
use keygate_db::SqliteLicenseStore;
use keygate_license::{LicenseEngine, LicenseStore, MemoryLicenseStore};
use keygate_server::{AdminAccess, AppState, ServerConfig, build_router, spawn_sweeper};
use keygate_throttle::{MAX_WINDOW_SECS, RateLimitConfig};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const MEMORY_DATABASE: &str = ":memory:";

#[derive(Parser, Debug)]
#[command(name = "keygate-server")]
#[command(about = "Keygate license issuance and verification service")]
struct Args {
    /// Address to bind
    #[arg(long, env = "KEYGATE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// HTTP port
    #[arg(short, long, env = "KEYGATE_PORT", default_value = "8000")]
    port: u16,

    /// SQLite database path, or ":memory:" for a volatile store
    #[arg(short, long, env = "KEYGATE_DATABASE", default_value = "license_system.db")]
    database: String,

    /// Verification requests admitted per client within one window
    #[arg(long, env = "KEYGATE_RATE_LIMIT_REQUESTS", default_value = "100")]
    rate_limit_requests: u32,

    /// Rate limit window length in seconds
    #[arg(
        long,
        env = "KEYGATE_RATE_LIMIT_WINDOW_SECS",
        default_value = "3600",
        value_parser = clap::value_parser!(i64).range(1..=MAX_WINDOW_SECS)
    )]
    rate_limit_window_secs: i64,

    /// How often idle rate limit entries are evicted, in seconds
    #[arg(long, env = "KEYGATE_SWEEP_INTERVAL_SECS", default_value = "300")]
    sweep_interval_secs: u64,

    /// Bearer token required on admin endpoints
    #[arg(long, env = "KEYGATE_ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,

    /// Serve admin endpoints without a token (local development only)
    #[arg(long)]
    allow_unauthenticated_admin: bool,

    /// Rate limit by X-Forwarded-For / X-Real-IP (only behind a trusted proxy)
    #[arg(long, env = "KEYGATE_TRUST_FORWARDED_HEADERS")]
    trust_forwarded_headers: bool,

    /// Comma-separated origins allowed by CORS ("*" for any, empty to disable)
    #[arg(long, env = "KEYGATE_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn open_store(database: &str) -> Result<Arc<dyn LicenseStore>> {
    if database == MEMORY_DATABASE {
        warn!("using in-memory store; licenses are lost on restart");
        return Ok(Arc::new(MemoryLicenseStore::new()));
    }
    let store = SqliteLicenseStore::open(database)
        .with_context(|| format!("failed to open database {database}"))?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Keygate server starting...");
    let store = open_store(&args.database)?;
    let engine = LicenseEngine::new(store);
    engine
        .health_check()
        .context("license store failed its startup check")?;

    let admin = AdminAccess::from_options(args.admin_token, args.allow_unauthenticated_admin);
    match admin {
        AdminAccess::Token(_) => info!("admin endpoints require a bearer token"),
        AdminAccess::Open => warn!("admin endpoints are open to unauthenticated callers"),
        AdminAccess::Disabled => warn!("no admin token configured; admin endpoints are disabled"),
    }

    let config = ServerConfig {
        rate_limit: RateLimitConfig::new(args.rate_limit_requests, args.rate_limit_window_secs)?,
        admin,
        sweep_interval: Duration::from_secs(args.sweep_interval_secs.max(1)),
        trust_forwarded_headers: args.trust_forwarded_headers,
        cors_origins: args
            .cors_origins
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect(),
    };
    if !config.trust_forwarded_headers {
        info!("rate limiting by peer address; forwarding headers are ignored");
    }
    let state = AppState::new(engine, config);
    let sweeper = spawn_sweeper(state.limiter.clone(), state.config.sweep_interval);
    let rate_limit = state.config.rate_limit;
    let app = build_router(state);

    let bind = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    let local = listener.local_addr()?;

    println!("\n========================================");
    println!("  Keygate Server Running");
    println!("========================================");
    println!("  Listening:  http://{}", local);
    println!("  Database:   {}", args.database);
    println!(
        "  Rate limit: {} requests / {}s",
        rate_limit.max_requests(),
        rate_limit.window_secs()
    );
    println!("========================================\n");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    sweeper.abort();
    info!("Keygate server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
