//! Mobile in-app-purchase provider webhook payloads.

use serde::Deserialize;

/// Prefix the mobile SDK uses before the app has identified the user.
pub const ANONYMOUS_USER_PREFIX: &str = "$RCAnonymousID:";

/// Envelope: `{"event": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MobileEnvelope {
    pub event: MobileEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MobileEvent {
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub app_user_id: String,

    pub event_timestamp_ms: i64,

    pub product_id: Option<String>,

    #[serde(default)]
    pub entitlement_ids: Vec<String>,

    /// NORMAL, TRIAL or INTRO.
    pub period_type: Option<String>,

    pub expiration_at_ms: Option<i64>,

    /// Stable across renewals of one purchase; used as the subscription id.
    pub original_transaction_id: Option<String>,
}

/// Known mobile event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileEventType {
    InitialPurchase,
    Renewal,
    ProductChange,
    Cancellation,
    Uncancellation,
    Expiration,
    BillingIssue,
}

impl MobileEventType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INITIAL_PURCHASE" => Some(Self::InitialPurchase),
            "RENEWAL" => Some(Self::Renewal),
            "PRODUCT_CHANGE" => Some(Self::ProductChange),
            "CANCELLATION" => Some(Self::Cancellation),
            "UNCANCELLATION" => Some(Self::Uncancellation),
            "EXPIRATION" => Some(Self::Expiration),
            "BILLING_ISSUE" => Some(Self::BillingIssue),
            _ => None,
        }
    }
}

impl MobileEvent {
    pub fn is_anonymous(&self) -> bool {
        self.app_user_id.trim().is_empty() || self.app_user_id.starts_with(ANONYMOUS_USER_PREFIX)
    }

    pub fn is_trial(&self) -> bool {
        self.period_type.as_deref() == Some("TRIAL")
    }
}
