//! Redis implementation of IdempotencyLedger.
//!
//! Claims are `SET key 1 NX EX <retention>`, so Redis expires old entries and
//! `prune_before` has nothing to do.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::entitlement::Provider;
use crate::domain::foundation::Timestamp;
use crate::ports::{IdempotencyLedger, LedgerError};

const KEY_PREFIX: &str = "entitlement:event";

/// Seconds in a day.
const DAY_SECS: u64 = 86_400;

/// Redis-backed ledger shared by every instance of the service.
#[derive(Clone)]
pub struct RedisIdempotencyLedger {
    conn: MultiplexedConnection,
    ttl_secs: Option<u64>,
}

impl RedisIdempotencyLedger {
    /// Connects to Redis. `retention_days` of 0 keeps claims forever.
    pub async fn connect(url: &str, retention_days: u32) -> Result<Self, LedgerError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self::new(conn, retention_days))
    }

    pub fn new(conn: MultiplexedConnection, retention_days: u32) -> Self {
        let ttl_secs = (retention_days > 0).then(|| u64::from(retention_days) * DAY_SECS);
        Self { conn, ttl_secs }
    }
}

fn unavailable(err: redis::RedisError) -> LedgerError {
    LedgerError::Unavailable(err.to_string())
}

fn claim_key(provider: Provider, event_id: &str) -> String {
    format!("{}:{}:{}", KEY_PREFIX, provider, event_id)
}

fn attempts_key(provider: Provider, event_id: &str) -> String {
    format!("{}:{}:{}:attempts", KEY_PREFIX, provider, event_id)
}

#[async_trait]
impl IdempotencyLedger for RedisIdempotencyLedger {
    async fn try_acquire(&self, provider: Provider, event_id: &str) -> Result<bool, LedgerError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(claim_key(provider, event_id)).arg(1).arg("NX");
        if let Some(ttl) = self.ttl_secs {
            cmd.arg("EX").arg(ttl);
        }

        // SET NX replies OK on success and nil when the key already exists
        let reply: Option<String> = cmd.query_async(&mut conn).await.map_err(unavailable)?;
        Ok(reply.is_some())
    }

    async fn release(&self, provider: Provider, event_id: &str) -> Result<(), LedgerError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(claim_key(provider, event_id))
            .await
            .map_err(unavailable)
    }

    async fn record_attempt(&self, provider: Provider, event_id: &str) -> Result<u32, LedgerError> {
        let mut conn = self.conn.clone();
        let key = attempts_key(provider, event_id);

        let attempts: u32 = conn.incr(&key, 1_i64).await.map_err(unavailable)?;
        if let Some(ttl) = self.ttl_secs {
            conn.expire::<_, ()>(&key, ttl as i64)
                .await
                .map_err(unavailable)?;
        }
        Ok(attempts)
    }

    async fn prune_before(&self, _cutoff: Timestamp) -> Result<u64, LedgerError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_provider() {
        assert_eq!(claim_key(Provider::Web, "evt_1"), "entitlement:event:web:evt_1");
        assert_ne!(
            claim_key(Provider::Web, "evt_1"),
            claim_key(Provider::Mobile, "evt_1")
        );
        assert_eq!(
            attempts_key(Provider::Mobile, "e1"),
            "entitlement:event:mobile:e1:attempts"
        );
    }
}
