//! SQLite license storage for Keygate.
//!
//! Implements [`keygate_license::LicenseStore`] over a single `licenses`
//! table. Timestamps are stored as UTC text in a fixed format, so lexical
//! order matches chronological order.

mod error;
mod store;

pub use error::{DbError, DbResult};
pub use store::SqliteLicenseStore;
