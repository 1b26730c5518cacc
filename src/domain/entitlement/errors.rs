//! Reconciliation errors.
//!
//! Every variant means the event was NOT applied and the record is untouched.

use thiserror::Error;

use super::{EventKind, Provider, SubscriptionStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Event references a subscription the slot does not hold.
    #[error("unknown {provider} subscription '{subscription_id}'")]
    UnknownSubscription {
        provider: Provider,
        subscription_id: String,
    },

    #[error("{kind} is not valid from {from}")]
    InvalidTransition {
        from: SubscriptionStatus,
        kind: EventKind,
    },

    /// Applying the event would break a record invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
