//! EntitlementStore port - durable per-user entitlement records.
//!
//! Writes are optimistic: callers read a record, apply an event, and write
//! back with the version they read. A concurrent writer makes the swap fail
//! with `VersionConflict` and the caller re-reads and reapplies.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entitlement::EntitlementRecord;
use crate::domain::foundation::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Stored version differs from the one the caller read. Retry locally.
    #[error("version conflict (expected {expected}, found {actual})")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("entitlement store unavailable: {0}")]
    Unavailable(String),
}

/// Port for entitlement record persistence.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Returns the user's record, or the default `version 0` record if none
    /// was ever written. Never returns "not found".
    async fn get(&self, user_id: &UserId) -> Result<EntitlementRecord, StoreError>;

    /// Writes `record` only if the stored version still equals
    /// `expected_version`. Expected version 0 means "no row yet".
    ///
    /// The write is all-or-nothing.
    async fn compare_and_swap(
        &self,
        user_id: &UserId,
        expected_version: u64,
        record: &EntitlementRecord,
    ) -> Result<(), StoreError>;
}
