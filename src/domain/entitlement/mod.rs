//! Entitlement domain module.
//!
//! Per-user entitlement records, the per-provider subscription state machine,
//! and the reconciliation engine that applies normalized provider events.
//!
//! # Module Structure
//!
//! - `plan` - Plan levels and their privilege rank
//! - `status` - SubscriptionStatus state machine for one provider slot
//! - `slot` - ProviderSlot state held per provider
//! - `record` - EntitlementRecord and the read-time projection
//! - `event` - Canonical EntitlementEvent
//! - `engine` - Applies events to records
//! - `plan_features` - Feature gating per plan

mod engine;
mod errors;
mod event;
mod plan;
mod plan_features;
mod provider;
mod record;
mod slot;
mod status;

pub use engine::{reconcile, Reconciliation, SkipReason};
pub use errors::ReconcileError;
pub use event::{EntitlementEvent, EventKind, EventPayload};
pub use plan::Plan;
pub use plan_features::{Feature, PlanFeatures};
pub use provider::Provider;
pub use record::{Entitlement, EntitlementRecord};
pub use slot::ProviderSlot;
pub use status::SubscriptionStatus;

#[cfg(test)]
pub(crate) use event::test_support;
