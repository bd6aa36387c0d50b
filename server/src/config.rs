//! Runtime configuration for the HTTP service.

use keygate_throttle::RateLimitConfig;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Who may call the administrative endpoints.
#[derive(Clone)]
pub enum AdminAccess {
    /// Callers must present `Authorization: Bearer <token>`.
    Token(String),
    /// Anyone may call admin endpoints. Only for local development.
    Open,
    /// Admin endpoints are refused outright.
    Disabled,
}

impl AdminAccess {
    /// Picks the access mode from the configured token and override flag.
    #[must_use]
    pub fn from_options(token: Option<String>, allow_unauthenticated: bool) -> Self {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => Self::Token(token),
            None if allow_unauthenticated => Self::Open,
            None => Self::Disabled,
        }
    }

    /// Returns true if `presented` matches the configured token.
    ///
    /// Both sides are hashed first so the comparison time does not depend
    /// on how many leading bytes match.
    #[must_use]
    pub fn token_matches(&self, presented: &str) -> bool {
        match self {
            Self::Token(expected) => {
                Sha256::digest(expected.as_bytes()) == Sha256::digest(presented.as_bytes())
            }
            Self::Open | Self::Disabled => false,
        }
    }
}

impl std::fmt::Debug for AdminAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::Open => f.write_str("Open"),
            Self::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Settings shared by every request handler.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub rate_limit: RateLimitConfig,
    pub admin: AdminAccess,
    /// How often idle rate-limiter identities are evicted.
    pub sweep_interval: Duration,
    /// Use `X-Forwarded-For` / `X-Real-IP` as the client identity. Only
    /// safe behind a proxy that overwrites those headers.
    pub trust_forwarded_headers: bool,
    /// Origins allowed to make cross-origin requests. `"*"` allows any;
    /// empty disables CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            admin: AdminAccess::Disabled,
            sweep_interval: Duration::from_secs(300),
            trust_forwarded_headers: false,
            cors_origins: Vec::new(),
        }
    }
}
