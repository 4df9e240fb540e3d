//! Persistence module for the login-activity audit log
//!
//! The log is append-only: records are created exactly once per login
//! or registration attempt and are immutable thereafter. No update or
//! delete path exists for this entity. Storage errors propagate to the
//! caller unchanged (fail loud), the opposite of the location
//! resolver's best-effort contract, and deliberately so.

pub mod sqlite_store;

pub use sqlite_store::SqliteActivityStore;

use crate::models::{LoginActivity, NewLoginActivity};
use thiserror::Error;

/// Errors that can occur during persistence operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid data in database: {0}")]
    InvalidData(String),
}

/// Trait for activity log storage backends
///
/// Implementations can use different document/relational backends; the
/// contract stays the same: the store assigns ids and timestamps, and
/// the read paths issue single-predicate queries without storage-side
/// ordering (recency ordering happens in-process in the recorder).
pub trait ActivityStore: Send + Sync {
    /// Append one activity record and return its assigned id.
    ///
    /// The timestamp is assigned here, at write time, never by the
    /// caller, so ordering stays authoritative regardless of client
    /// clock skew. Absent optional fields are written as explicit
    /// NULLs, never omitted.
    fn record(&self, activity: &NewLoginActivity) -> Result<String, StoreError>;

    /// Fetch up to `limit` records for one user.
    ///
    /// Equality predicate on `user_id` only, no secondary sort, so no
    /// composite index is required.
    fn by_user(&self, user_id: &str, limit: usize) -> Result<Vec<LoginActivity>, StoreError>;

    /// Fetch up to `limit` records with no predicate (admin review).
    fn recent(&self, limit: usize) -> Result<Vec<LoginActivity>, StoreError>;
}
