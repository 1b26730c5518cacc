//! OperatorAlerts port - events that need a human.
//!
//! Alerts are fire-and-forget: delivery problems are the adapter's concern
//! and never fail webhook processing.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entitlement::Provider;

/// Something an operator must reconcile by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperatorAlert {
    /// Event set aside after exhausting retries.
    DeadLetter {
        dead_letter_id: Uuid,
        provider: Provider,
        event_id: String,
        attempts: u32,
        reason: String,
    },

    /// Event verified and normalized but refused by the reconciliation engine.
    RejectedEvent {
        provider: Provider,
        event_id: String,
        user_id: String,
        reason: String,
    },
}

impl OperatorAlert {
    pub fn event_id(&self) -> &str {
        match self {
            OperatorAlert::DeadLetter { event_id, .. } | OperatorAlert::RejectedEvent { event_id, .. } => {
                event_id
            }
        }
    }
}

/// Port for the operator alert channel.
#[async_trait]
pub trait OperatorAlerts: Send + Sync {
    async fn raise(&self, alert: OperatorAlert);
}
