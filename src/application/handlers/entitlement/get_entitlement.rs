//! GetEntitlementHandler - Query handler for a user's effective entitlement.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::entitlement::{Plan, Provider, ProviderSlot, SubscriptionStatus};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::EntitlementStore;

#[derive(Debug, Clone)]
pub struct GetEntitlementQuery {
    pub user_id: UserId,
}

/// Effective entitlement plus per-provider detail, for API consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitlementView {
    pub user_id: UserId,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub source: Option<Provider>,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
    pub version: u64,
    pub web: Option<ProviderSlot>,
    pub mobile: Option<ProviderSlot>,
    /// True when the store could not be read and the view was failed closed.
    pub degraded: bool,
}

impl EntitlementView {
    /// Least-privileged view, used when the real record is unknown.
    pub fn fail_closed(user_id: UserId) -> Self {
        Self {
            user_id,
            plan: Plan::Free,
            status: SubscriptionStatus::NoSubscription,
            source: None,
            current_period_end: None,
            cancel_at_period_end: false,
            version: 0,
            web: None,
            mobile: None,
            degraded: true,
        }
    }
}

/// Handler for entitlement reads.
///
/// Never errors: an unreadable record degrades to the free tier rather than
/// granting anything.
#[derive(Clone)]
pub struct GetEntitlementHandler {
    store: Arc<dyn EntitlementStore>,
}

impl GetEntitlementHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetEntitlementQuery) -> EntitlementView {
        self.handle_at(query, Timestamp::now()).await
    }

    pub async fn handle_at(&self, query: GetEntitlementQuery, now: Timestamp) -> EntitlementView {
        let record = match self.store.get(&query.user_id).await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(
                    user_id = %query.user_id,
                    error = %err,
                    "entitlement read failed, serving fail-closed view"
                );
                return EntitlementView::fail_closed(query.user_id);
            }
        };

        let effective = record.effective_at(now);
        let seeded = |slot: &ProviderSlot| {
            (slot.status != SubscriptionStatus::NoSubscription).then(|| slot.clone())
        };

        EntitlementView {
            plan: effective.plan,
            status: effective.status,
            source: effective.source,
            current_period_end: effective.current_period_end,
            cancel_at_period_end: effective.cancel_at_period_end,
            version: record.version,
            web: seeded(&record.web),
            mobile: seeded(&record.mobile),
            degraded: false,
            user_id: record.user_id,
        }
    }
}
