//! Error types for the licensing module.

use thiserror::Error;

/// Failures reported by a [`LicenseStore`](crate::LicenseStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same license key already exists.
    #[error("duplicate license key: {0}")]
    DuplicateKey(String),

    /// No record exists for the given license key.
    #[error("license not found: {0}")]
    NotFound(String),

    /// Every generated key collided with an existing record.
    #[error("could not allocate a unique license key after {attempts} attempts")]
    KeyCollisionsExhausted {
        /// Number of insert attempts made.
        attempts: u32,
    },

    /// The persistence layer is unavailable or failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Invalid license key format.
    #[error("invalid license key format: {0}")]
    InvalidKeyFormat(String),

    /// Unknown plan type identifier.
    #[error("invalid plan type: {0}")]
    InvalidPlan(String),

    /// No license exists for the given key.
    #[error("license not found: {0}")]
    NotFound(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl LicenseError {
    /// Returns true if this error originates from the persistence layer.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
