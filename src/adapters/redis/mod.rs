//! Redis adapters.

mod idempotency_ledger;

pub use idempotency_ledger::RedisIdempotencyLedger;
