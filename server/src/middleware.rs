//! Request middleware: admission control, admin auth and response headers.

use crate::AppState;
use crate::config::AdminAccess;
use crate::error::ApiError;
use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::json;
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Identity used for rate limiting.
///
/// With `trust_forwarded`, the first `X-Forwarded-For` hop wins, then
/// `X-Real-IP`. Otherwise those headers are client-controlled and ignored,
/// and only the peer address counts.
pub fn client_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded: bool,
) -> String {
    let peer_identity = || {
        peer.map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string())
    };
    if !trust_forwarded {
        return peer_identity();
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer_identity()
}

/// Rejects callers that exceeded the verification rate limit.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = client_identity(req.headers(), peer, state.config.trust_forwarded_headers);

    if !state.limiter.is_allowed(&identity, Utc::now()) {
        let retry_after = state.config.rate_limit.window_secs();
        warn!(%identity, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after.to_string())],
            Json(json!({
                "detail": "too many requests, please try again later",
                "retry_after": retry_after,
            })),
        )
            .into_response();
    }

    debug!(%identity, method = %req.method(), uri = %req.uri(), "admitted request");
    next.run(req).await
}

/// Guards administrative routes.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let admin = &state.config.admin;
    match admin {
        AdminAccess::Open => next.run(req).await,
        AdminAccess::Disabled => ApiError::Forbidden.into_response(),
        AdminAccess::Token(_) => {
            let authorized = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .is_some_and(|token| admin.token_matches(token));
            if authorized {
                next.run(req).await
            } else {
                warn!(uri = %req.uri(), "rejected admin request");
                ApiError::Unauthorized.into_response()
            }
        }
    }
}

/// Adds the standard hardening headers to every response.
pub async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    response
}
