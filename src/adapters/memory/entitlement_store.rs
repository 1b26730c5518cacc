//! In-memory EntitlementStore for development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::entitlement::EntitlementRecord;
use crate::domain::foundation::UserId;
use crate::ports::{EntitlementStore, StoreError};

/// Entitlement records held in a process-local map.
#[derive(Default)]
pub struct InMemoryEntitlementStore {
    records: RwLock<HashMap<UserId, EntitlementRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `Unavailable`, to exercise fail-closed paths.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntitlementStore for InMemoryEntitlementStore {
    async fn get(&self, user_id: &UserId) -> Result<EntitlementRecord, StoreError> {
        self.check_available()?;
        Ok(self
            .records
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| EntitlementRecord::new(user_id.clone())))
    }

    async fn compare_and_swap(
        &self,
        user_id: &UserId,
        expected_version: u64,
        record: &EntitlementRecord,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut records = self.records.write().await;
        let actual = records.get(user_id).map(|r| r.version).unwrap_or(0);
        if actual != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual,
            });
        }
        records.insert(user_id.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn bumped(version: u64) -> EntitlementRecord {
        EntitlementRecord {
            version,
            ..EntitlementRecord::new(user())
        }
    }

    #[tokio::test]
    async fn get_returns_default_without_persisting() {
        let store = InMemoryEntitlementStore::new();
        let record = store.get(&user()).await.unwrap();
        assert_eq!(record.version, 0);
        assert!(store.records.read().await.is_empty());
    }

    #[tokio::test]
    async fn cas_from_zero_creates_record() {
        let store = InMemoryEntitlementStore::new();
        store.compare_and_swap(&user(), 0, &bumped(1)).await.unwrap();
        assert_eq!(store.get(&user()).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn cas_with_stale_version_conflicts_and_leaves_record() {
        let store = InMemoryEntitlementStore::new();
        store.compare_and_swap(&user(), 0, &bumped(1)).await.unwrap();

        let result = store.compare_and_swap(&user(), 0, &bumped(1)).await;
        assert_eq!(
            result,
            Err(StoreError::VersionConflict {
                expected: 0,
                actual: 1
            })
        );
        assert_eq!(store.get(&user()).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn unavailable_store_fails_reads() {
        let store = InMemoryEntitlementStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.get(&user()).await, Err(StoreError::Unavailable(_))));
    }
}
