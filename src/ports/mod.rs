//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `EntitlementStore` - Per-user records with compare-and-swap writes
//! - `IdempotencyLedger` - `(provider, event_id)` claims for webhook dedupe
//! - `OperatorAlerts` - Dead letters and rejected events for manual handling
//! - `CheckoutGateway` - Provider-hosted checkout and billing portal

mod checkout_gateway;
mod entitlement_store;
mod idempotency_ledger;
mod operator_alerts;

pub use checkout_gateway::{
    CheckoutGateway, CheckoutRequest, CheckoutSession, GatewayError, GatewayErrorCode,
    PortalSession,
};
pub use entitlement_store::{EntitlementStore, StoreError};
pub use idempotency_ledger::{IdempotencyLedger, LedgerError};
pub use operator_alerts::{OperatorAlert, OperatorAlerts};
