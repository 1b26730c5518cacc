//! In-memory IdempotencyLedger for development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::entitlement::Provider;
use crate::domain::foundation::Timestamp;
use crate::ports::{IdempotencyLedger, LedgerError};

type Key = (Provider, String);

#[derive(Default)]
struct Entries {
    claims: HashMap<Key, Timestamp>,
    attempts: HashMap<Key, (u32, Timestamp)>,
}

/// Ledger backed by process-local maps behind one mutex.
///
/// Correct only within a single process.
#[derive(Default)]
pub struct InMemoryIdempotencyLedger {
    entries: Mutex<Entries>,
}

impl InMemoryIdempotencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_claimed(&self, provider: Provider, event_id: &str) -> bool {
        self.entries
            .lock()
            .await
            .claims
            .contains_key(&(provider, event_id.to_string()))
    }
}

#[async_trait]
impl IdempotencyLedger for InMemoryIdempotencyLedger {
    async fn try_acquire(&self, provider: Provider, event_id: &str) -> Result<bool, LedgerError> {
        let mut entries = self.entries.lock().await;
        let key = (provider, event_id.to_string());
        if entries.claims.contains_key(&key) {
            return Ok(false);
        }
        entries.claims.insert(key, Timestamp::now());
        Ok(true)
    }

    async fn release(&self, provider: Provider, event_id: &str) -> Result<(), LedgerError> {
        self.entries
            .lock()
            .await
            .claims
            .remove(&(provider, event_id.to_string()));
        Ok(())
    }

    async fn record_attempt(&self, provider: Provider, event_id: &str) -> Result<u32, LedgerError> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .attempts
            .entry((provider, event_id.to_string()))
            .or_insert((0, Timestamp::now()));
        entry.0 += 1;
        entry.1 = Timestamp::now();
        Ok(entry.0)
    }

    async fn prune_before(&self, cutoff: Timestamp) -> Result<u64, LedgerError> {
        let mut entries = self.entries.lock().await;
        let before = entries.claims.len() + entries.attempts.len();
        entries.claims.retain(|_, at| !at.is_before(&cutoff));
        entries.attempts.retain(|_, (_, at)| !at.is_before(&cutoff));
        let after = entries.claims.len() + entries.attempts.len();
        Ok((before - after) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::Arc;

    #[tokio::test]
    async fn first_acquire_wins_and_later_ones_are_duplicates() {
        let ledger = InMemoryIdempotencyLedger::new();
        assert!(ledger.try_acquire(Provider::Web, "evt_1").await.unwrap());
        assert!(!ledger.try_acquire(Provider::Web, "evt_1").await.unwrap());
    }

    #[tokio::test]
    async fn providers_are_separate_namespaces() {
        let ledger = InMemoryIdempotencyLedger::new();
        assert!(ledger.try_acquire(Provider::Web, "evt_1").await.unwrap());
        assert!(ledger.try_acquire(Provider::Mobile, "evt_1").await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_acquires_have_exactly_one_winner() {
        let ledger = Arc::new(InMemoryIdempotencyLedger::new());
        let attempts = (0..16).map(|_| {
            let ledger = Arc::clone(&ledger);
            async move { ledger.try_acquire(Provider::Mobile, "evt_dup").await.unwrap() }
        });
        let winners = join_all(attempts).await.into_iter().filter(|won| *won).count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn release_allows_reacquire() {
        let ledger = InMemoryIdempotencyLedger::new();
        assert!(ledger.try_acquire(Provider::Web, "evt_1").await.unwrap());
        ledger.release(Provider::Web, "evt_1").await.unwrap();
        assert!(ledger.try_acquire(Provider::Web, "evt_1").await.unwrap());
    }

    #[tokio::test]
    async fn attempts_accumulate_per_event() {
        let ledger = InMemoryIdempotencyLedger::new();
        assert_eq!(ledger.record_attempt(Provider::Web, "evt_1").await.unwrap(), 1);
        assert_eq!(ledger.record_attempt(Provider::Web, "evt_1").await.unwrap(), 2);
        assert_eq!(ledger.record_attempt(Provider::Web, "evt_2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn prune_removes_entries_older_than_cutoff() {
        let ledger = InMemoryIdempotencyLedger::new();
        ledger.try_acquire(Provider::Web, "evt_1").await.unwrap();
        ledger.record_attempt(Provider::Web, "evt_2").await.unwrap();

        assert_eq!(ledger.prune_before(Timestamp::now().add_days(-1).unwrap()).await.unwrap(), 0);
        assert_eq!(ledger.prune_before(Timestamp::now().add_secs(1).unwrap()).await.unwrap(), 2);
        assert!(!ledger.is_claimed(Provider::Web, "evt_1").await);
    }
}
