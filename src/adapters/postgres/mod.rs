//! PostgreSQL adapters.
//!
//! - `PostgresEntitlementStore` - per-user records with versioned swaps
//! - `PostgresIdempotencyLedger` - event claims and delivery attempt counters

mod entitlement_store;
mod idempotency_ledger;

pub use entitlement_store::PostgresEntitlementStore;
pub use idempotency_ledger::PostgresIdempotencyLedger;
