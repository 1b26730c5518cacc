//! Maps verified provider payloads into canonical entitlement events.
//!
//! One branch per provider and event type. Pure: no I/O, no clock.

use serde::de::DeserializeOwned;
use std::collections::HashMap;

use super::errors::NormalizationError;
use super::mobile_event::{MobileEnvelope, MobileEvent, MobileEventType};
use super::web_event::{CheckoutSession, Invoice, Subscription, WebEvent, WebEventType};
use crate::domain::entitlement::{
    EntitlementEvent, EventKind, EventPayload, Plan, Provider, SubscriptionStatus,
};
use crate::domain::foundation::{Timestamp, UserId};

/// Maps provider price and product identifiers to plans.
#[derive(Debug, Clone, Default)]
pub struct PriceCatalog {
    plans: HashMap<String, Plan>,
}

impl PriceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, plan: Plan) -> Self {
        self.plans.insert(id.into(), plan);
        self
    }

    pub fn plan_for(&self, id: &str) -> Option<Plan> {
        self.plans.get(id).copied()
    }

    /// Reverse lookup used when opening a checkout for a plan.
    pub fn price_for(&self, plan: Plan) -> Option<&str> {
        let mut ids: Vec<&String> = self
            .plans
            .iter()
            .filter(|(_, p)| **p == plan)
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids.first().map(|id| id.as_str())
    }
}

/// Provider payload normalizer.
pub struct EventNormalizer {
    catalog: PriceCatalog,
}

impl EventNormalizer {
    pub fn new(catalog: PriceCatalog) -> Self {
        Self { catalog }
    }

    /// Normalizes a raw, already verified, provider payload.
    pub fn normalize(
        &self,
        provider: Provider,
        raw_body: &[u8],
    ) -> Result<EntitlementEvent, NormalizationError> {
        match provider {
            Provider::Web => self.normalize_web(parse(raw_body)?),
            Provider::Mobile => {
                let envelope: MobileEnvelope = parse(raw_body)?;
                self.normalize_mobile(envelope.event)
            }
        }
    }

    fn normalize_web(&self, event: WebEvent) -> Result<EntitlementEvent, NormalizationError> {
        let event_type = WebEventType::parse(&event.event_type)
            .ok_or_else(|| NormalizationError::UnrecognizedEventKind(event.event_type.clone()))?;
        let occurred_at = Timestamp::from_unix_secs(event.created)
            .ok_or_else(|| malformed("created timestamp out of range"))?;
        let object = event.data.object.clone();

        let (kind, user, payload) = match event_type {
            WebEventType::CheckoutSessionCompleted => {
                let session: CheckoutSession = from_object(object)?;
                if session.mode != "subscription" {
                    return Err(NormalizationError::UnrecognizedEventKind(format!(
                        "{} ({} mode)",
                        event.event_type, session.mode
                    )));
                }
                // Sessions carry neither trial status nor period end; a slot seeded here
                // reads as active until the next customer.subscription.* event corrects it.
                let plan = plan_from_metadata(session.metadata.get("plan"))?
                    .ok_or_else(|| malformed("checkout session without plan metadata"))?;
                (
                    EventKind::CheckoutCompleted,
                    session.user_id().map(str::to_string),
                    EventPayload {
                        plan: Some(plan),
                        external_customer_id: session.customer.clone(),
                        external_subscription_id: session.subscription.clone(),
                        ..EventPayload::default()
                    },
                )
            }
            WebEventType::SubscriptionCreated
            | WebEventType::SubscriptionUpdated
            | WebEventType::SubscriptionDeleted => {
                let subscription: Subscription = from_object(object)?;
                let kind = match event_type {
                    WebEventType::SubscriptionCreated => EventKind::SubscriptionCreated,
                    WebEventType::SubscriptionUpdated => EventKind::SubscriptionUpdated,
                    _ => EventKind::SubscriptionCanceled,
                };
                // The billed price wins; checkout metadata goes stale after portal plan changes
                let plan = match self.catalog_plan(subscription.items.first_price_id()) {
                    Some(plan) => Some(plan),
                    None => plan_from_metadata(subscription.metadata.get("plan"))?,
                };
                let period_end = subscription
                    .current_period_end
                    .or_else(|| subscription.items.first_period_end());
                (
                    kind,
                    subscription.metadata.get("user_id").cloned(),
                    EventPayload {
                        plan,
                        status: Some(web_status(&subscription.status)?),
                        current_period_end: period_end.and_then(Timestamp::from_unix_secs),
                        cancel_at_period_end: Some(subscription.cancel_at_period_end),
                        external_customer_id: subscription.customer.clone(),
                        external_subscription_id: Some(subscription.id.clone()),
                    },
                )
            }
            WebEventType::InvoicePaid | WebEventType::InvoicePaymentFailed => {
                let invoice: Invoice = from_object(object)?;
                if invoice.subscription.is_none() {
                    return Err(NormalizationError::UnrecognizedEventKind(format!(
                        "{} (no subscription)",
                        event.event_type
                    )));
                }
                let kind = if event_type == WebEventType::InvoicePaid {
                    EventKind::PaymentSucceeded
                } else {
                    EventKind::PaymentFailed
                };
                (
                    kind,
                    invoice.user_id().map(str::to_string),
                    EventPayload {
                        plan: self.catalog_plan(invoice.lines.first_price_id()),
                        current_period_end: invoice
                            .lines
                            .first_period_end()
                            .and_then(Timestamp::from_unix_secs),
                        external_customer_id: invoice.customer.clone(),
                        external_subscription_id: invoice.subscription.clone(),
                        ..EventPayload::default()
                    },
                )
            }
        };

        let user_id = user
            .and_then(|id| UserId::new(id).ok())
            .ok_or_else(|| NormalizationError::MissingUserMapping {
                event_id: event.id.clone(),
            })?;

        Ok(EntitlementEvent {
            event_id: event.id,
            provider: Provider::Web,
            user_id,
            kind,
            occurred_at,
            payload,
        })
    }

    fn normalize_mobile(&self, event: MobileEvent) -> Result<EntitlementEvent, NormalizationError> {
        let event_type = MobileEventType::parse(&event.event_type)
            .ok_or_else(|| NormalizationError::UnrecognizedEventKind(event.event_type.clone()))?;
        let occurred_at = Timestamp::from_unix_millis(event.event_timestamp_ms)
            .ok_or_else(|| malformed("event_timestamp_ms out of range"))?;

        if event.is_anonymous() {
            return Err(NormalizationError::MissingUserMapping { event_id: event.id });
        }
        let user_id = UserId::new(event.app_user_id.clone()).map_err(|_| {
            NormalizationError::MissingUserMapping {
                event_id: event.id.clone(),
            }
        })?;

        let plan = self.mobile_plan(&event);
        let base = EventPayload {
            plan,
            current_period_end: event.expiration_at_ms.and_then(Timestamp::from_unix_millis),
            external_subscription_id: event.original_transaction_id.clone(),
            ..EventPayload::default()
        };

        let (kind, payload) = match event_type {
            MobileEventType::InitialPurchase => {
                if plan.is_none() {
                    return Err(malformed("initial purchase for unknown product"));
                }
                let status = if event.is_trial() {
                    SubscriptionStatus::Trialing
                } else {
                    SubscriptionStatus::Active
                };
                (
                    EventKind::CheckoutCompleted,
                    EventPayload {
                        status: Some(status),
                        cancel_at_period_end: Some(false),
                        ..base
                    },
                )
            }
            MobileEventType::Renewal => (EventKind::PaymentSucceeded, base),
            MobileEventType::ProductChange => (EventKind::SubscriptionUpdated, base),
            MobileEventType::Cancellation => (
                EventKind::SubscriptionUpdated,
                EventPayload {
                    cancel_at_period_end: Some(true),
                    ..base
                },
            ),
            MobileEventType::Uncancellation => (
                EventKind::SubscriptionUpdated,
                EventPayload {
                    cancel_at_period_end: Some(false),
                    ..base
                },
            ),
            MobileEventType::Expiration => (EventKind::SubscriptionCanceled, base),
            MobileEventType::BillingIssue => (EventKind::PaymentFailed, base),
        };

        Ok(EntitlementEvent {
            event_id: event.id,
            provider: Provider::Mobile,
            user_id,
            kind,
            occurred_at,
            payload,
        })
    }

    fn catalog_plan(&self, id: Option<&str>) -> Option<Plan> {
        id.and_then(|id| self.catalog.plan_for(id))
    }

    /// Product id through the catalog, then entitlement identifiers named after plans.
    fn mobile_plan(&self, event: &MobileEvent) -> Option<Plan> {
        self.catalog_plan(event.product_id.as_deref()).or_else(|| {
            event
                .entitlement_ids
                .iter()
                .filter_map(|id| id.parse::<Plan>().ok())
                .max_by_key(|plan| plan.rank())
        })
    }
}

fn parse<T: DeserializeOwned>(raw_body: &[u8]) -> Result<T, NormalizationError> {
    serde_json::from_slice(raw_body).map_err(|e| malformed(e.to_string()))
}

fn from_object<T: DeserializeOwned>(object: serde_json::Value) -> Result<T, NormalizationError> {
    serde_json::from_value(object).map_err(|e| malformed(e.to_string()))
}

fn malformed(reason: impl Into<String>) -> NormalizationError {
    NormalizationError::MalformedPayload(reason.into())
}

fn plan_from_metadata(value: Option<&String>) -> Result<Option<Plan>, NormalizationError> {
    value
        .map(|raw| raw.parse::<Plan>().map_err(|e| malformed(e.to_string())))
        .transpose()
}

/// Maps web subscription statuses onto slot statuses.
fn web_status(status: &str) -> Result<SubscriptionStatus, NormalizationError> {
    match status {
        "trialing" => Ok(SubscriptionStatus::Trialing),
        "active" => Ok(SubscriptionStatus::Active),
        "past_due" => Ok(SubscriptionStatus::PastDue),
        "unpaid" | "incomplete" | "paused" => Ok(SubscriptionStatus::Unpaid),
        "canceled" | "incomplete_expired" => Ok(SubscriptionStatus::Canceled),
        other => Err(malformed(format!("unknown subscription status '{}'", other))),
    }
}
