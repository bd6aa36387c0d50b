//! License lifecycle for Keygate.
//!
//! This crate handles:
//! - License key generation and format validation
//! - Plan types and expiry computation
//! - The verification state machine (valid/expired/disabled/not found)
//! - The storage contract that backends implement
//!
//! # License Key Format
//!
//! Keys are formatted as `XXXX-XXXX-XXXX-XXXX`, using uppercase letters and
//! digits without `I`, `O`, `0` or `1`. The format is a stable contract and
//! is matched exactly, without case folding.
//!
//! # Verification Order
//!
//! 1. Malformed keys are reported as not found without touching storage.
//! 2. Unknown keys are reported as not found.
//! 3. Disabled licenses are reported as disabled, even if also expired.
//! 4. Licenses past their end date are reported as expired.
//! 5. Everything else is valid.

mod engine;
mod error;
mod ids;
mod key;
mod plan;
mod record;
mod status;
mod store;

pub use engine::{DEFAULT_MAX_KEY_ATTEMPTS, LicenseEngine};
pub use error::{LicenseError, LicenseResult, StoreError, StoreResult};
pub use ids::LicenseId;
pub use key::{KEY_ALPHABET, KEY_ENTROPY_BITS, KEY_GROUP_LEN, KEY_GROUPS, KEY_LEN, LicenseKey};
pub use plan::PlanType;
pub use record::{LicenseRecord, LicenseUpdate};
pub use status::{LicenseStatus, VerificationOutcome};
pub use store::{LicenseStore, MemoryLicenseStore};
