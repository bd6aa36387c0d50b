//! Verification outcomes.

use crate::plan::PlanType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of verifying a presented key. Computed on every call, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// The license exists, is active and has not expired.
    Valid {
        plan_type: PlanType,
        end_date: Option<DateTime<Utc>>,
        owner_email: Option<String>,
    },
    /// The license exists but its end date has passed.
    Expired,
    /// The license exists but was disabled by an administrator.
    Disabled,
    /// The key is malformed or unknown. The two cases are indistinguishable.
    NotFound,
}

impl VerificationOutcome {
    /// Returns the bare status without the payload.
    #[must_use]
    pub fn status(&self) -> LicenseStatus {
        match self {
            Self::Valid { .. } => LicenseStatus::Valid,
            Self::Expired => LicenseStatus::Expired,
            Self::Disabled => LicenseStatus::Disabled,
            Self::NotFound => LicenseStatus::NotFound,
        }
    }

    /// Returns true only for [`VerificationOutcome::Valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// The four verification states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    Valid,
    Expired,
    Disabled,
    NotFound,
}

impl LicenseStatus {
    /// Returns the wire spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Expired => "expired",
            Self::Disabled => "disabled",
            Self::NotFound => "not_found",
        }
    }

    /// Human-readable message shown to verifiers.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Valid => "license verified",
            Self::Expired => "license has expired",
            Self::Disabled => "license has been disabled",
            Self::NotFound => "license not found",
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
