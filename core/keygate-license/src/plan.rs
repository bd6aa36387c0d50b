//! License plan types and their validity periods.

use crate::error::LicenseError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The plan a license was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanType {
    /// One-day trial.
    #[serde(rename = "trial1")]
    Trial1Day,
    /// Three-day trial.
    #[serde(rename = "trial3")]
    Trial3Day,
    /// 30 days.
    #[serde(rename = "30d")]
    Days30,
    /// 180 days.
    #[serde(rename = "180d")]
    Days180,
    /// 365 days.
    #[serde(rename = "365d")]
    Days365,
    /// Never expires.
    #[serde(rename = "lifetime")]
    Lifetime,
}

impl PlanType {
    /// Every plan, shortest first.
    pub const ALL: [PlanType; 6] = [
        Self::Trial1Day,
        Self::Trial3Day,
        Self::Days30,
        Self::Days180,
        Self::Days365,
        Self::Lifetime,
    ];

    /// Returns the validity period in days, or None for lifetime.
    #[must_use]
    pub const fn duration_days(&self) -> Option<i64> {
        match self {
            Self::Trial1Day => Some(1),
            Self::Trial3Day => Some(3),
            Self::Days30 => Some(30),
            Self::Days180 => Some(180),
            Self::Days365 => Some(365),
            Self::Lifetime => None,
        }
    }

    /// Returns true for the plan that never expires.
    #[must_use]
    pub const fn is_lifetime(&self) -> bool {
        matches!(self, Self::Lifetime)
    }

    /// Returns true for the trial plans.
    #[must_use]
    pub const fn is_trial(&self) -> bool {
        matches!(self, Self::Trial1Day | Self::Trial3Day)
    }

    /// Computes the end date for a license starting at `start`.
    #[must_use]
    pub fn end_date_from(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration_days().map(|days| start + Duration::days(days))
    }

    /// Returns the stable identifier used on the wire and in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trial1Day => "trial1",
            Self::Trial3Day => "trial3",
            Self::Days30 => "30d",
            Self::Days180 => "180d",
            Self::Days365 => "365d",
            Self::Lifetime => "lifetime",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|plan| plan.as_str() == s)
            .ok_or_else(|| LicenseError::InvalidPlan(s.to_string()))
    }
}
