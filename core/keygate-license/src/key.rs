//! License key generation and format validation.
//!
//! License keys use the format `XXXX-XXXX-XXXX-XXXX`: four groups of four
//! characters drawn from a 32-symbol alphabet of uppercase letters and
//! digits with the visually ambiguous `I`, `O`, `0` and `1` removed.
//!
//! Validation is exact and case-sensitive. Callers that want to accept
//! lowercase or padded input must normalize before validating.

use crate::error::{LicenseError, LicenseResult};
use rand::{Rng, rngs::OsRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Symbols a license key may contain.
pub const KEY_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of hyphen-separated groups in a key.
pub const KEY_GROUPS: usize = 4;

/// Number of characters in each group.
pub const KEY_GROUP_LEN: usize = 4;

/// Total length of a formatted key, hyphens included.
pub const KEY_LEN: usize = KEY_GROUPS * KEY_GROUP_LEN + (KEY_GROUPS - 1);

/// Entropy of a randomly generated key (32^16).
pub const KEY_ENTROPY_BITS: u32 = 80;

/// A license key in canonical `XXXX-XXXX-XXXX-XXXX` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Generates a fresh random key using the operating system CSPRNG.
    ///
    /// Uniqueness is not guaranteed; persistence must go through an
    /// insert that rejects duplicates.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let mut key = String::with_capacity(KEY_LEN);

        for group in 0..KEY_GROUPS {
            if group > 0 {
                key.push('-');
            }
            for _ in 0..KEY_GROUP_LEN {
                let idx = rng.gen_range(0..KEY_ALPHABET.len());
                key.push(char::from(KEY_ALPHABET[idx]));
            }
        }

        Self(key)
    }

    /// Generates `count` pairwise-distinct keys.
    #[must_use]
    pub fn generate_batch(count: usize) -> HashSet<Self> {
        let mut keys = HashSet::with_capacity(count);
        while keys.len() < count {
            keys.insert(Self::generate());
        }
        keys
    }

    /// Returns true if `candidate` is a well-formed license key.
    #[must_use]
    pub fn is_valid_format(candidate: &str) -> bool {
        let bytes = candidate.as_bytes();
        if bytes.len() != KEY_LEN {
            return false;
        }

        bytes.iter().enumerate().all(|(i, b)| {
            if i % (KEY_GROUP_LEN + 1) == KEY_GROUP_LEN {
                *b == b'-'
            } else {
                KEY_ALPHABET.contains(b)
            }
        })
    }

    /// Parses a key string, rejecting anything that is not in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidKeyFormat`] if the string fails
    /// [`is_valid_format`](Self::is_valid_format).
    pub fn parse(candidate: &str) -> LicenseResult<Self> {
        if Self::is_valid_format(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(LicenseError::InvalidKeyFormat(format!(
                "expected {KEY_GROUPS} groups of {KEY_GROUP_LEN} characters from the key alphabet"
            )))
        }
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LicenseKey {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LicenseKey {
    type Error = LicenseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LicenseKey> for String {
    fn from(key: LicenseKey) -> Self {
        key.0
    }
}

impl AsRef<str> for LicenseKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
