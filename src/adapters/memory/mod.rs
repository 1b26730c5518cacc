//! In-memory adapters.
//!
//! Used when no database is configured and throughout the test suites.

mod entitlement_store;
mod idempotency_ledger;
mod operator_alerts;

pub use entitlement_store::InMemoryEntitlementStore;
pub use idempotency_ledger::InMemoryIdempotencyLedger;
pub use operator_alerts::RecordingOperatorAlerts;
