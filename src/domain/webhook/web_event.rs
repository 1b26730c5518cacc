//! Web provider (Stripe-shaped) webhook payloads.
//!
//! Only fields used for reconciliation are captured; everything else in the
//! provider's schema is ignored.

use serde::Deserialize;
use std::collections::HashMap;

/// Web webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebEvent {
    /// Unique event identifier (evt_...).
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the provider created the event.
    pub created: i64,

    pub data: WebEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebEventData {
    /// The object that triggered the event, shaped by `type`.
    pub object: serde_json::Value,
}

/// Known web event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebEventType {
    CheckoutSessionCompleted,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    InvoicePaid,
    InvoicePaymentFailed,
}

impl WebEventType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "checkout.session.completed" => Some(Self::CheckoutSessionCompleted),
            "customer.subscription.created" => Some(Self::SubscriptionCreated),
            "customer.subscription.updated" => Some(Self::SubscriptionUpdated),
            "customer.subscription.deleted" => Some(Self::SubscriptionDeleted),
            "invoice.payment_succeeded" | "invoice.paid" => Some(Self::InvoicePaid),
            "invoice.payment_failed" => Some(Self::InvoicePaymentFailed),
            _ => None,
        }
    }
}

/// Checkout session object.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub client_reference_id: Option<String>,
    /// payment, setup, or subscription.
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Subscription object.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer: Option<String>,
    pub status: String,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub items: ItemList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemList {
    #[serde(default)]
    pub data: Vec<LineItem>,
}

/// Subscription item or invoice line.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    pub price: Option<Price>,
    pub period: Option<Period>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Period {
    pub end: i64,
}

/// Invoice object.
#[derive(Debug, Clone, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub subscription_details: Option<SubscriptionDetails>,
    #[serde(default)]
    pub lines: ItemList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionDetails {
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ItemList {
    /// Price id of the first line, which carries the plan.
    pub fn first_price_id(&self) -> Option<&str> {
        self.data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.as_str())
    }

    pub fn first_period_end(&self) -> Option<i64> {
        self.data
            .first()
            .and_then(|item| item.period.as_ref())
            .map(|period| period.end)
    }
}

impl Invoice {
    /// User id from the subscription's metadata, falling back to the invoice's.
    pub fn user_id(&self) -> Option<&str> {
        self.subscription_details
            .as_ref()
            .and_then(|details| details.metadata.get("user_id"))
            .or_else(|| self.metadata.get("user_id"))
            .map(String::as_str)
    }
}

impl CheckoutSession {
    pub fn user_id(&self) -> Option<&str> {
        self.client_reference_id
            .as_deref()
            .or_else(|| self.metadata.get("user_id").map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_both_invoice_success_types() {
        assert_eq!(WebEventType::parse("invoice.paid"), Some(WebEventType::InvoicePaid));
        assert_eq!(
            WebEventType::parse("invoice.payment_succeeded"),
            Some(WebEventType::InvoicePaid)
        );
        assert_eq!(WebEventType::parse("customer.created"), None);
    }

    #[test]
    fn invoice_user_id_prefers_subscription_details() {
        let invoice: Invoice = serde_json::from_value(json!({
            "id": "in_1",
            "metadata": {"user_id": "from-invoice"},
            "subscription_details": {"metadata": {"user_id": "from-subscription"}}
        }))
        .unwrap();
        assert_eq!(invoice.user_id(), Some("from-subscription"));
    }

    #[test]
    fn checkout_user_id_prefers_client_reference() {
        let session: CheckoutSession = serde_json::from_value(json!({
            "id": "cs_1",
            "client_reference_id": "ref-user",
            "metadata": {"user_id": "meta-user"}
        }))
        .unwrap();
        assert_eq!(session.user_id(), Some("ref-user"));
    }

    #[test]
    fn item_list_reads_first_line() {
        let items: ItemList = serde_json::from_value(json!({
            "data": [{"price": {"id": "price_pro"}, "period": {"end": 1700000000}}]
        }))
        .unwrap();
        assert_eq!(items.first_price_id(), Some("price_pro"));
        assert_eq!(items.first_period_end(), Some(1700000000));
        assert_eq!(ItemList::default().first_price_id(), None);
    }
}
