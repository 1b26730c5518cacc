//! Entitlement handlers.
//!
//! ## Commands
//! - Processing provider webhooks
//! - Pruning the idempotency ledger
//!
//! ## Queries
//! - Effective entitlement for a user
//! - Feature checks against the effective plan

mod check_feature;
mod get_entitlement;
mod process_webhook;
mod prune_ledger;

// Commands
pub use process_webhook::{
    ProcessWebhookCommand, ProcessWebhookHandler, RetryLimits, WebhookOutcome,
};
pub use prune_ledger::PruneLedgerHandler;

// Queries
pub use check_feature::{CheckFeatureHandler, CheckFeatureQuery, FeatureCheck};
pub use get_entitlement::{EntitlementView, GetEntitlementHandler, GetEntitlementQuery};
