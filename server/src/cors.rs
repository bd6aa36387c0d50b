use axum::http::{HeaderName, HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(600);

/// Build a CORS layer for the configured origins.
///
/// Returns `None` when no origin is configured. Credentials are never
/// allowed; admin calls authenticate with a bearer header instead.
pub fn build_cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let methods = [Method::GET, Method::POST, Method::PATCH, Method::OPTIONS];
    let headers: [HeaderName; 2] = [header::AUTHORIZATION, header::CONTENT_TYPE];
    let layer = CorsLayer::new()
        .allow_methods(methods)
        .allow_headers(headers)
        .expose_headers([header::RETRY_AFTER])
        .max_age(PREFLIGHT_MAX_AGE);

    if origins.iter().any(|o| o == "*") {
        warn!("CORS allows any origin; list explicit origins for production deployments");
        return Some(layer.allow_origin(Any));
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if allowed.is_empty() {
        return None;
    }
    Some(layer.allow_origin(allowed))
}
