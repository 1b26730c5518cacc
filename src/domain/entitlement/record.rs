//! Per-user entitlement record and its read-time projection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{Plan, Provider, ProviderSlot, SubscriptionStatus};
use crate::domain::foundation::{Timestamp, UserId};

/// Canonical entitlement record, one per user.
///
/// Holds one slot per provider. The effective plan is never stored; it is
/// projected from both slots at read time so neither side's history is lost
/// when the other lapses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    pub user_id: UserId,
    pub web: ProviderSlot,
    pub mobile: ProviderSlot,
    /// Incremented on every applied event.
    pub version: u64,
}

/// Effective entitlement at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub plan: Plan,
    pub status: SubscriptionStatus,
    /// Slot that produced this entitlement. `None` for a never-seeded record.
    pub source: Option<Provider>,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
}

impl Entitlement {
    /// Free tier in good standing.
    pub fn free() -> Self {
        Self {
            plan: Plan::Free,
            status: SubscriptionStatus::Active,
            source: None,
            current_period_end: None,
            cancel_at_period_end: false,
        }
    }

    fn from_slot(provider: Provider, slot: &ProviderSlot, plan: Plan) -> Self {
        Self {
            plan,
            status: slot.status,
            source: Some(provider),
            current_period_end: slot.current_period_end,
            cancel_at_period_end: slot.cancel_at_period_end,
        }
    }
}

impl EntitlementRecord {
    /// Default record for a user with no applied events.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            web: ProviderSlot::empty(),
            mobile: ProviderSlot::empty(),
            version: 0,
        }
    }

    pub fn slot(&self, provider: Provider) -> &ProviderSlot {
        match provider {
            Provider::Web => &self.web,
            Provider::Mobile => &self.mobile,
        }
    }

    pub fn slot_mut(&mut self, provider: Provider) -> &mut ProviderSlot {
        match provider {
            Provider::Web => &mut self.web,
            Provider::Mobile => &mut self.mobile,
        }
    }

    /// Projects the effective entitlement at `now`.
    ///
    /// The highest plan among granting slots wins. Ties go to the later
    /// period end, then to the web slot. With no granting slot, the most
    /// recently written slot reports the lapsed status on the free plan.
    pub fn effective_at(&self, now: Timestamp) -> Entitlement {
        let winner = Provider::ALL
            .into_iter()
            .filter(|p| self.slot(*p).grants_at(now))
            .reduce(|best, candidate| match compare_grants(self.slot(candidate), self.slot(best)) {
                Ordering::Greater => candidate,
                _ => best,
            });

        if let Some(provider) = winner {
            let slot = self.slot(provider);
            return Entitlement::from_slot(provider, slot, slot.plan);
        }

        let last_written = Provider::ALL
            .into_iter()
            .filter(|p| self.slot(*p).status != SubscriptionStatus::NoSubscription)
            .reduce(|latest, candidate| {
                if self.slot(candidate).last_applied_occurred_at
                    > self.slot(latest).last_applied_occurred_at
                {
                    candidate
                } else {
                    latest
                }
            });

        match last_written {
            Some(provider) => Entitlement::from_slot(provider, self.slot(provider), Plan::Free),
            None => Entitlement::free(),
        }
    }

    /// Provider customer id for the web slot, used by the billing portal.
    pub fn web_customer_id(&self) -> Option<&str> {
        self.web.external_customer_id.as_deref()
    }
}

fn compare_grants(a: &ProviderSlot, b: &ProviderSlot) -> Ordering {
    a.plan
        .rank()
        .cmp(&b.plan.rank())
        .then_with(|| a.current_period_end.cmp(&b.current_period_end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn record() -> EntitlementRecord {
        EntitlementRecord::new(UserId::new("user-1").unwrap())
    }

    fn live(plan: Plan, period_end: i64) -> ProviderSlot {
        ProviderSlot {
            status: SubscriptionStatus::Active,
            plan,
            current_period_end: Some(ts(period_end)),
            last_applied_occurred_at: Some(ts(1)),
            ..ProviderSlot::empty()
        }
    }

    #[test]
    fn new_record_is_free_active_version_zero() {
        let r = record();
        assert_eq!(r.version, 0);
        assert_eq!(r.effective_at(ts(0)), Entitlement::free());
    }

    #[test]
    fn mobile_max_beats_canceled_web_pro() {
        let mut r = record();
        r.web = ProviderSlot {
            status: SubscriptionStatus::Canceled,
            ..live(Plan::Pro, 50)
        };
        r.mobile = live(Plan::Max, 500);

        let e = r.effective_at(ts(100));
        assert_eq!(e.plan, Plan::Max);
        assert_eq!(e.source, Some(Provider::Mobile));
    }

    #[test]
    fn higher_plan_wins_even_with_earlier_period_end() {
        let mut r = record();
        r.web = live(Plan::Max, 100);
        r.mobile = live(Plan::Pro, 900);

        assert_eq!(r.effective_at(ts(10)).source, Some(Provider::Web));
    }

    #[test]
    fn equal_plans_prefer_later_period_end() {
        let mut r = record();
        r.web = live(Plan::Pro, 100);
        r.mobile = live(Plan::Pro, 200);

        assert_eq!(r.effective_at(ts(10)).source, Some(Provider::Mobile));
    }

    #[test]
    fn full_tie_prefers_web() {
        let mut r = record();
        r.web = live(Plan::Pro, 100);
        r.mobile = live(Plan::Pro, 100);

        assert_eq!(r.effective_at(ts(10)).source, Some(Provider::Web));
    }

    #[test]
    fn lapsed_record_reports_free_with_last_status() {
        let mut r = record();
        r.web = ProviderSlot {
            status: SubscriptionStatus::Canceled,
            ..live(Plan::Pro, 50)
        };

        let e = r.effective_at(ts(100));
        assert_eq!(e.plan, Plan::Free);
        assert_eq!(e.status, SubscriptionStatus::Canceled);
        assert_eq!(e.source, Some(Provider::Web));
    }

    #[test]
    fn projection_never_reports_live_status_on_free_plan() {
        let mut r = record();
        r.web = ProviderSlot {
            status: SubscriptionStatus::PastDue,
            ..live(Plan::Pro, 50)
        };
        let e = r.effective_at(ts(100));
        assert!(!(e.status.is_live() && e.plan == Plan::Free && e.source.is_some()));
    }
}
