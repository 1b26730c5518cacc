//! Per-provider subscription state.

use serde::{Deserialize, Serialize};

use super::{Plan, SubscriptionStatus};
use crate::domain::foundation::Timestamp;

/// Independent subscription state tracked for one billing provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSlot {
    pub status: SubscriptionStatus,
    pub plan: Plan,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
    pub external_customer_id: Option<String>,
    pub external_subscription_id: Option<String>,
    /// Provider-reported time of the newest event applied to this slot.
    pub last_applied_occurred_at: Option<Timestamp>,
}

impl ProviderSlot {
    /// An unseeded slot.
    pub fn empty() -> Self {
        Self {
            status: SubscriptionStatus::NoSubscription,
            plan: Plan::Free,
            current_period_end: None,
            cancel_at_period_end: false,
            external_customer_id: None,
            external_subscription_id: None,
            last_applied_occurred_at: None,
        }
    }

    /// Returns true if this slot currently grants its plan.
    ///
    /// Live statuses always grant. Past-due, unpaid and canceled slots keep
    /// granting until the paid period runs out.
    pub fn grants_at(&self, now: Timestamp) -> bool {
        if !self.plan.is_paid() || self.status == SubscriptionStatus::NoSubscription {
            return false;
        }
        if self.status.is_live() {
            return true;
        }
        self.current_period_end
            .map(|end| !now.is_after(&end))
            .unwrap_or(false)
    }

    /// Returns true if an event for `subscription_id` belongs to this slot.
    ///
    /// Events without a subscription id are attributed to the current one.
    pub fn owns_subscription(&self, subscription_id: Option<&str>) -> bool {
        match (subscription_id, self.external_subscription_id.as_deref()) {
            (None, _) => true,
            (Some(incoming), Some(current)) => incoming == current,
            (Some(_), None) => false,
        }
    }
}

impl Default for ProviderSlot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn slot(status: SubscriptionStatus, plan: Plan, period_end: Option<i64>) -> ProviderSlot {
        ProviderSlot {
            status,
            plan,
            current_period_end: period_end.map(ts),
            external_subscription_id: Some("sub_1".to_string()),
            ..ProviderSlot::empty()
        }
    }

    #[test]
    fn empty_slot_grants_nothing() {
        assert!(!ProviderSlot::empty().grants_at(ts(0)));
    }

    #[test]
    fn live_slot_grants_even_after_period_end() {
        let s = slot(SubscriptionStatus::Active, Plan::Pro, Some(100));
        assert!(s.grants_at(ts(1_000)));
    }

    #[test]
    fn lapsed_slot_grants_until_period_end() {
        let s = slot(SubscriptionStatus::Canceled, Plan::Max, Some(100));
        assert!(s.grants_at(ts(100)));
        assert!(!s.grants_at(ts(101)));
    }

    #[test]
    fn past_due_without_period_end_does_not_grant() {
        let s = slot(SubscriptionStatus::PastDue, Plan::Pro, None);
        assert!(!s.grants_at(ts(0)));
    }

    #[test]
    fn owns_subscription_matches_seeded_id() {
        let s = slot(SubscriptionStatus::Active, Plan::Pro, None);
        assert!(s.owns_subscription(Some("sub_1")));
        assert!(s.owns_subscription(None));
        assert!(!s.owns_subscription(Some("sub_2")));
        assert!(!ProviderSlot::empty().owns_subscription(Some("sub_1")));
    }
}
