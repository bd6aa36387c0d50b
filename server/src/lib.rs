//! HTTP API for the Keygate license service.

pub mod api;
pub mod config;
pub mod cors;
mod error;
pub mod middleware;
mod validate;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
};
use chrono::Utc;
use keygate_license::LicenseEngine;
use keygate_throttle::RateLimiter;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

pub use config::{AdminAccess, ServerConfig};
pub use cors::build_cors_layer;
pub use error::ApiError;
pub use validate::is_valid_email;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: LicenseEngine,
    pub limiter: Arc<RateLimiter>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(engine: LicenseEngine, config: ServerConfig) -> Self {
        Self {
            engine,
            limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            config: Arc::new(config),
        }
    }
}

/// Build the HTTP API router.
pub fn build_router(state: AppState) -> Router {
    let verify = Router::new()
        .route("/verify/{license_key}", get(api::verify))
        .route_layer(from_fn_with_state(state.clone(), middleware::rate_limit));

    let admin = Router::new()
        .route("/generate", post(api::generate))
        .route("/licenses", get(api::list))
        .route("/licenses/{license_key}", patch(api::update))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_admin));

    let router = Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .merge(verify)
        .merge(admin);
    let router = match cors::build_cors_layer(&state.config.cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        .layer(from_fn(middleware::security_headers))
        .with_state(state)
}

/// Periodically evicts idle identities from the rate limiter.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, every: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = limiter.sweep_idle(Utc::now());
            debug!(evicted, remaining = limiter.tracked_identities(), "rate limiter sweep");
        }
    })
}
