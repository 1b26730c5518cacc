//! PostgreSQL implementation of IdempotencyLedger.
//!
//! The primary key on `(provider, event_id)` makes the first insert win;
//! concurrent deliveries see zero affected rows.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entitlement::Provider;
use crate::domain::foundation::Timestamp;
use crate::ports::{IdempotencyLedger, LedgerError};

pub struct PostgresIdempotencyLedger {
    pool: PgPool,
}

impl PostgresIdempotencyLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(err: sqlx::Error) -> LedgerError {
    LedgerError::Unavailable(err.to_string())
}

#[async_trait]
impl IdempotencyLedger for PostgresIdempotencyLedger {
    async fn try_acquire(&self, provider: Provider, event_id: &str) -> Result<bool, LedgerError> {
        let result = sqlx::query(
            r#"
            INSERT INTO processed_events (provider, event_id, claimed_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (provider, event_id) DO NOTHING
            "#,
        )
        .bind(provider.as_str())
        .bind(event_id)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, provider: Provider, event_id: &str) -> Result<(), LedgerError> {
        sqlx::query("DELETE FROM processed_events WHERE provider = $1 AND event_id = $2")
            .bind(provider.as_str())
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn record_attempt(&self, provider: Provider, event_id: &str) -> Result<u32, LedgerError> {
        let attempts: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO delivery_attempts (provider, event_id, attempts, last_attempt_at)
            VALUES ($1, $2, 1, NOW())
            ON CONFLICT (provider, event_id)
            DO UPDATE SET attempts = delivery_attempts.attempts + 1, last_attempt_at = NOW()
            RETURNING attempts
            "#,
        )
        .bind(provider.as_str())
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(attempts.max(0) as u32)
    }

    async fn prune_before(&self, cutoff: Timestamp) -> Result<u64, LedgerError> {
        let claims = sqlx::query("DELETE FROM processed_events WHERE claimed_at < $1")
            .bind(cutoff.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        let attempts = sqlx::query("DELETE FROM delivery_attempts WHERE last_attempt_at < $1")
            .bind(cutoff.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(claims.rows_affected() + attempts.rows_affected())
    }
}
