//! Persisted license records and the fields an administrator may change.

use crate::ids::LicenseId;
use crate::key::LicenseKey;
use crate::plan::PlanType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A license as stored by a [`LicenseStore`](crate::LicenseStore).
///
/// `key`, `plan_type`, `start_date` and `end_date` are fixed at creation.
/// Only `owner_email`, `active` and `updated_at` change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub id: LicenseId,
    pub key: LicenseKey,
    pub plan_type: PlanType,
    pub owner_email: Option<String>,
    pub start_date: DateTime<Utc>,
    /// None exactly when `plan_type` is lifetime.
    pub end_date: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LicenseRecord {
    /// Builds an active record starting at `now`, with the end date derived
    /// from the plan.
    #[must_use]
    pub fn new(
        key: LicenseKey,
        plan_type: PlanType,
        owner_email: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LicenseId::new(),
            key,
            plan_type,
            owner_email,
            start_date: now,
            end_date: plan_type.end_date_from(now),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the license has a finite end date at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.plan_type.is_lifetime() {
            return false;
        }
        self.end_date.is_some_and(|end| end <= now)
    }

    /// Applies an administrative update in place. An empty update leaves
    /// `updated_at` untouched.
    pub fn apply(&mut self, update: &LicenseUpdate, now: DateTime<Utc>) {
        if update.is_empty() {
            return;
        }
        if let Some(email) = &update.owner_email {
            self.owner_email = Some(email.clone());
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        self.updated_at = now;
    }
}

/// Mutable fields of a license. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseUpdate {
    pub owner_email: Option<String>,
    pub active: Option<bool>,
}

impl LicenseUpdate {
    /// An update that only toggles the active flag.
    #[must_use]
    pub fn set_active(active: bool) -> Self {
        Self {
            owner_email: None,
            active: Some(active),
        }
    }

    /// An update that only rebinds the owner email.
    #[must_use]
    pub fn set_owner_email(email: impl Into<String>) -> Self {
        Self {
            owner_email: Some(email.into()),
            active: None,
        }
    }

    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owner_email.is_none() && self.active.is_none()
    }
}
