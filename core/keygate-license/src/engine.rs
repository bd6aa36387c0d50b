//! License creation, verification and administration.

use crate::error::{LicenseError, LicenseResult, StoreError};
use crate::key::LicenseKey;
use crate::plan::PlanType;
use crate::record::{LicenseRecord, LicenseUpdate};
use crate::status::VerificationOutcome;
use crate::store::LicenseStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of insert attempts before giving up on key collisions.
pub const DEFAULT_MAX_KEY_ATTEMPTS: u32 = 5;

/// Composes key generation with a [`LicenseStore`].
///
/// The engine holds no mutable state of its own and can be shared freely
/// across threads behind an `Arc`.
#[derive(Clone)]
pub struct LicenseEngine {
    store: Arc<dyn LicenseStore>,
    max_key_attempts: u32,
}

impl LicenseEngine {
    /// Creates an engine over `store`.
    pub fn new(store: Arc<dyn LicenseStore>) -> Self {
        Self {
            store,
            max_key_attempts: DEFAULT_MAX_KEY_ATTEMPTS,
        }
    }

    /// Overrides the collision retry bound. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_key_attempts(mut self, attempts: u32) -> Self {
        self.max_key_attempts = attempts.max(1);
        self
    }

    /// Issues a new license starting now.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Store`] if persistence fails or every
    /// generated key collides.
    pub fn create_license(
        &self,
        plan_type: PlanType,
        owner_email: Option<String>,
    ) -> LicenseResult<LicenseRecord> {
        self.create_license_at(plan_type, owner_email, Utc::now())
    }

    /// Issues a new license starting at `now`.
    pub fn create_license_at(
        &self,
        plan_type: PlanType,
        owner_email: Option<String>,
        now: DateTime<Utc>,
    ) -> LicenseResult<LicenseRecord> {
        for attempt in 1..=self.max_key_attempts {
            let record = LicenseRecord::new(
                LicenseKey::generate(),
                plan_type,
                owner_email.clone(),
                now,
            );

            match self.store.insert_if_absent(&record) {
                Ok(()) => {
                    info!(plan = %plan_type, id = %record.id, "generated license");
                    return Ok(record);
                }
                Err(StoreError::DuplicateKey(_)) => {
                    warn!(attempt, "generated license key collided, retrying");
                }
                Err(e) => {
                    warn!(error = %e, "failed to persist license");
                    return Err(e.into());
                }
            }
        }

        Err(StoreError::KeyCollisionsExhausted {
            attempts: self.max_key_attempts,
        }
        .into())
    }

    /// Verifies a presented key against the current time.
    ///
    /// # Errors
    ///
    /// Only store failures are errors; every business outcome is a
    /// [`VerificationOutcome`].
    pub fn verify(&self, key: &str) -> LicenseResult<VerificationOutcome> {
        self.verify_at(key, Utc::now())
    }

    /// Verifies a presented key against `now`.
    ///
    /// Disabled takes precedence over expired, so re-enabling an expired
    /// license reports it as expired rather than valid.
    pub fn verify_at(&self, key: &str, now: DateTime<Utc>) -> LicenseResult<VerificationOutcome> {
        if !LicenseKey::is_valid_format(key) {
            debug!("rejected malformed license key");
            return Ok(VerificationOutcome::NotFound);
        }

        let Some(record) = self.store.find_by_key(key)? else {
            debug!(key, "license key not found");
            return Ok(VerificationOutcome::NotFound);
        };

        let outcome = if !record.active {
            VerificationOutcome::Disabled
        } else if record.is_expired_at(now) {
            VerificationOutcome::Expired
        } else {
            VerificationOutcome::Valid {
                plan_type: record.plan_type,
                end_date: record.end_date,
                owner_email: record.owner_email,
            }
        };

        debug!(key, status = %outcome.status(), "verified license");
        Ok(outcome)
    }

    /// Fetches a record without evaluating its status.
    pub fn get_license(&self, key: &str) -> LicenseResult<Option<LicenseRecord>> {
        if !LicenseKey::is_valid_format(key) {
            return Ok(None);
        }
        Ok(self.store.find_by_key(key)?)
    }

    /// Applies an administrative update.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::NotFound`] if the key is unknown.
    pub fn update_license(&self, key: &str, update: &LicenseUpdate) -> LicenseResult<LicenseRecord> {
        match self.store.update_fields(key, update, Utc::now()) {
            Ok(record) => {
                info!(
                    key,
                    active = record.active,
                    email_changed = update.owner_email.is_some(),
                    "updated license"
                );
                Ok(record)
            }
            Err(StoreError::NotFound(k)) => Err(LicenseError::NotFound(k)),
            Err(e) => Err(e.into()),
        }
    }

    /// Disables a license.
    pub fn disable(&self, key: &str) -> LicenseResult<LicenseRecord> {
        self.update_license(key, &LicenseUpdate::set_active(false))
    }

    /// Re-enables a disabled license.
    pub fn enable(&self, key: &str) -> LicenseResult<LicenseRecord> {
        self.update_license(key, &LicenseUpdate::set_active(true))
    }

    /// Binds a license to a different owner email.
    pub fn rebind_email(&self, key: &str, email: impl Into<String>) -> LicenseResult<LicenseRecord> {
        self.update_license(key, &LicenseUpdate::set_owner_email(email))
    }

    /// Lists every license, newest first.
    pub fn list_licenses(&self) -> LicenseResult<Vec<LicenseRecord>> {
        Ok(self.store.list_all()?)
    }

    /// Checks that the store is reachable.
    pub fn health_check(&self) -> LicenseResult<()> {
        Ok(self.store.ping()?)
    }
}

impl std::fmt::Debug for LicenseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseEngine")
            .field("max_key_attempts", &self.max_key_attempts)
            .finish_non_exhaustive()
    }
}
