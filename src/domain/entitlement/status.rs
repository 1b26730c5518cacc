//! Provider-slot subscription status state machine.
//!
//! Lifecycle per provider slot:
//!
//! ```text
//! no_subscription -> trialing -> active -> {past_due | unpaid} -> active
//!                                       \-> canceled (terminal)
//! ```

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Subscription status held by a single provider slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Slot has never been seeded by a checkout.
    NoSubscription,

    /// Trial period, full access.
    Trialing,

    /// Paid and current.
    Active,

    /// Latest payment failed, provider is retrying.
    PastDue,

    /// Provider gave up retrying but has not canceled.
    Unpaid,

    /// Subscription ended. Terminal for the slot.
    Canceled,
}

impl SubscriptionStatus {
    /// Returns true for statuses that grant the slot's plan regardless of period end.
    pub fn is_live(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }

    /// Returns true once a checkout has seeded the slot and it has not ended.
    pub fn is_seeded(&self) -> bool {
        !matches!(
            self,
            SubscriptionStatus::NoSubscription | SubscriptionStatus::Canceled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::NoSubscription => "no_subscription",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use SubscriptionStatus::*;
        match s {
            "no_subscription" => Ok(NoSubscription),
            "trialing" => Ok(Trialing),
            "active" => Ok(Active),
            "past_due" => Ok(PastDue),
            "unpaid" => Ok(Unpaid),
            "canceled" => Ok(Canceled),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown subscription status '{}'", other),
            )),
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        match (self, target) {
            // Only a checkout leaves no_subscription
            (NoSubscription, Trialing) | (NoSubscription, Active) => true,
            (NoSubscription, _) => false,
            // Terminal
            (Canceled, _) => false,
            // Between non-terminal states, including renewals in place
            (_, NoSubscription) => false,
            (_, _) => true,
        }
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            NoSubscription => vec![Trialing, Active],
            Trialing | Active | PastDue | Unpaid => {
                vec![Trialing, Active, PastDue, Unpaid, Canceled]
            }
            Canceled => vec![],
        }
    }
}
