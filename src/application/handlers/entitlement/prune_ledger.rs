//! PruneLedgerHandler - Command handler for idempotency ledger retention.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::ports::{IdempotencyLedger, LedgerError};

/// Deletes ledger entries older than the retention window.
///
/// A retention of 0 days keeps everything.
pub struct PruneLedgerHandler {
    ledger: Arc<dyn IdempotencyLedger>,
    retention_days: u32,
}

impl PruneLedgerHandler {
    pub fn new(ledger: Arc<dyn IdempotencyLedger>, retention_days: u32) -> Self {
        Self {
            ledger,
            retention_days,
        }
    }

    pub async fn handle(&self) -> Result<u64, LedgerError> {
        self.handle_at(Timestamp::now()).await
    }

    pub async fn handle_at(&self, now: Timestamp) -> Result<u64, LedgerError> {
        if self.retention_days == 0 {
            return Ok(0);
        }

        let Some(cutoff) = now.add_days(-i64::from(self.retention_days)) else {
            tracing::warn!(
                retention_days = self.retention_days,
                "retention window reaches past the earliest timestamp; nothing to prune"
            );
            return Ok(0);
        };
        let pruned = self.ledger.prune_before(cutoff).await?;
        if pruned > 0 {
            tracing::info!(pruned, cutoff = %cutoff, "idempotency ledger pruned");
        }
        Ok(pruned)
    }
}
