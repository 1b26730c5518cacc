//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Durable entitlement store and idempotency ledger
//! - `redis` - TTL-based idempotency ledger
//! - `memory` - In-process implementations for tests and single-node runs
//! - `stripe` - Web checkout and portal call-through
//! - `alerts` - Operator alerts over structured logs
//! - `http` - axum routes

pub mod alerts;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod redis;
pub mod stripe;

pub use alerts::TracingOperatorAlerts;
pub use memory::{InMemoryEntitlementStore, InMemoryIdempotencyLedger, RecordingOperatorAlerts};
pub use postgres::{PostgresEntitlementStore, PostgresIdempotencyLedger};
pub use self::redis::RedisIdempotencyLedger;
pub use stripe::{GatewayCall, MockCheckoutGateway, StripeCheckoutGateway, StripeConfig};
