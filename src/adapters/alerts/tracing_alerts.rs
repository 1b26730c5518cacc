//! Operator alerts emitted as structured tracing events.
//!
//! Log shipping routes the `operator_alert` target to whoever is on call.

use async_trait::async_trait;

use crate::ports::{OperatorAlert, OperatorAlerts};

pub const ALERT_TARGET: &str = "operator_alert";

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOperatorAlerts;

impl TracingOperatorAlerts {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OperatorAlerts for TracingOperatorAlerts {
    async fn raise(&self, alert: OperatorAlert) {
        let payload = serde_json::to_string(&alert).unwrap_or_default();
        match &alert {
            OperatorAlert::DeadLetter {
                dead_letter_id,
                provider,
                event_id,
                attempts,
                reason,
            } => {
                tracing::error!(
                    target: ALERT_TARGET,
                    %dead_letter_id,
                    %provider,
                    event_id = %event_id,
                    attempts,
                    reason = %reason,
                    alert = %payload,
                    "webhook event dead-lettered"
                );
            }
            OperatorAlert::RejectedEvent {
                provider,
                event_id,
                user_id,
                reason,
            } => {
                tracing::error!(
                    target: ALERT_TARGET,
                    %provider,
                    event_id = %event_id,
                    user_id = %user_id,
                    reason = %reason,
                    alert = %payload,
                    "webhook event rejected by reconciliation"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::domain::entitlement::Provider;

    #[tokio::test]
    async fn raising_an_alert_does_not_fail() {
        let alerts = TracingOperatorAlerts::new();
        alerts
            .raise(OperatorAlert::DeadLetter {
                dead_letter_id: Uuid::new_v4(),
                provider: Provider::Mobile,
                event_id: "evt_1".to_string(),
                attempts: 5,
                reason: "anonymous app user".to_string(),
            })
            .await;
    }
}
