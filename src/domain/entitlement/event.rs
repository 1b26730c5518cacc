//! Canonical entitlement events produced by the normalizer.

use serde::{Deserialize, Serialize};

use super::{Plan, Provider, SubscriptionStatus};
use crate::domain::foundation::{Timestamp, UserId};

/// Kind of a normalized entitlement event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionCanceled,
    PaymentSucceeded,
    PaymentFailed,
    CheckoutCompleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SubscriptionCreated => "subscription_created",
            EventKind::SubscriptionUpdated => "subscription_updated",
            EventKind::SubscriptionCanceled => "subscription_canceled",
            EventKind::PaymentSucceeded => "payment_succeeded",
            EventKind::PaymentFailed => "payment_failed",
            EventKind::CheckoutCompleted => "checkout_completed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized subset of provider fields relevant to an event.
///
/// `None` means the provider did not say, and the slot keeps its value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub plan: Option<Plan>,
    pub status: Option<SubscriptionStatus>,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: Option<bool>,
    pub external_customer_id: Option<String>,
    pub external_subscription_id: Option<String>,
}

/// Provider event mapped into the canonical shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementEvent {
    /// Provider-scoped unique identifier.
    pub event_id: String,
    pub provider: Provider,
    pub user_id: UserId,
    pub kind: EventKind,
    /// Provider-reported event time, used for ordering.
    pub occurred_at: Timestamp,
    pub payload: EventPayload,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builder for events in tests.
    pub struct EventBuilder {
        event: EntitlementEvent,
    }

    impl EventBuilder {
        pub fn new(kind: EventKind, provider: Provider, occurred_at_secs: i64) -> Self {
            Self {
                event: EntitlementEvent {
                    event_id: format!("evt_{}_{}", kind.as_str(), occurred_at_secs),
                    provider,
                    user_id: UserId::new("user-1").unwrap(),
                    kind,
                    occurred_at: Timestamp::from_unix_secs(occurred_at_secs).unwrap(),
                    payload: EventPayload {
                        external_subscription_id: Some("sub_1".to_string()),
                        ..EventPayload::default()
                    },
                },
            }
        }

        pub fn id(mut self, id: &str) -> Self {
            self.event.event_id = id.to_string();
            self
        }

        pub fn plan(mut self, plan: Plan) -> Self {
            self.event.payload.plan = Some(plan);
            self
        }

        pub fn status(mut self, status: SubscriptionStatus) -> Self {
            self.event.payload.status = Some(status);
            self
        }

        pub fn period_end(mut self, secs: i64) -> Self {
            self.event.payload.current_period_end = Timestamp::from_unix_secs(secs);
            self
        }

        pub fn cancel_at_period_end(mut self, cancel: bool) -> Self {
            self.event.payload.cancel_at_period_end = Some(cancel);
            self
        }

        pub fn subscription(mut self, id: &str) -> Self {
            self.event.payload.external_subscription_id = Some(id.to_string());
            self
        }

        pub fn build(self) -> EntitlementEvent {
            self.event
        }
    }
}
