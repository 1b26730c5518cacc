//! IdempotencyLedger port - deduplication of at-least-once webhook delivery.
//!
//! Keyed by `(provider, event_id)`. A duplicate is a normal outcome, never an
//! error; errors mean the ledger itself could not be reached.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entitlement::Provider;
use crate::domain::foundation::Timestamp;
use crate::domain::webhook::WebhookError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("idempotency ledger unavailable: {0}")]
    Unavailable(String),
}

impl From<LedgerError> for WebhookError {
    fn from(err: LedgerError) -> Self {
        WebhookError::StorageUnavailable(err.to_string())
    }
}

/// Port for recording which provider events have been claimed.
#[async_trait]
pub trait IdempotencyLedger: Send + Sync {
    /// Atomically records the pair and returns true on first sight.
    ///
    /// Returns false for every later call with the same pair, including calls
    /// racing concurrently with the first.
    async fn try_acquire(&self, provider: Provider, event_id: &str) -> Result<bool, LedgerError>;

    /// Removes a claim so the provider's next delivery is processed again.
    ///
    /// Used when processing failed after the claim was taken.
    async fn release(&self, provider: Provider, event_id: &str) -> Result<(), LedgerError>;

    /// Counts one more delivery of an event that could not be processed yet.
    ///
    /// Returns the total count including this one.
    async fn record_attempt(&self, provider: Provider, event_id: &str) -> Result<u32, LedgerError>;

    /// Deletes claims and attempt counters older than `cutoff`.
    ///
    /// Returns the number of entries deleted.
    async fn prune_before(&self, cutoff: Timestamp) -> Result<u64, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotency_ledger_is_object_safe() {
        fn _accepts_dyn(_ledger: &dyn IdempotencyLedger) {}
    }

    #[test]
    fn ledger_errors_become_retryable_webhook_errors() {
        let err: WebhookError = LedgerError::Unavailable("timeout".to_string()).into();
        assert!(err.is_retryable());
    }
}
