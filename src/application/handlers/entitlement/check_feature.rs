//! CheckFeatureHandler - Query handler for plan-gated features.

use serde::Serialize;

use super::get_entitlement::{GetEntitlementHandler, GetEntitlementQuery};
use crate::domain::entitlement::{Feature, Plan, PlanFeatures};
use crate::domain::foundation::{Timestamp, UserId};

#[derive(Debug, Clone)]
pub struct CheckFeatureQuery {
    pub user_id: UserId,
    pub feature: Feature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureCheck {
    pub feature: Feature,
    pub plan: Plan,
    pub granted: bool,
    pub degraded: bool,
}

/// Answers whether the user's effective plan includes a feature.
///
/// A degraded entitlement read never grants.
#[derive(Clone)]
pub struct CheckFeatureHandler {
    entitlements: GetEntitlementHandler,
}

impl CheckFeatureHandler {
    pub fn new(entitlements: GetEntitlementHandler) -> Self {
        Self { entitlements }
    }

    pub async fn handle(&self, query: CheckFeatureQuery) -> FeatureCheck {
        self.handle_at(query, Timestamp::now()).await
    }

    pub async fn handle_at(&self, query: CheckFeatureQuery, now: Timestamp) -> FeatureCheck {
        let view = self
            .entitlements
            .handle_at(
                GetEntitlementQuery {
                    user_id: query.user_id,
                },
                now,
            )
            .await;

        let granted = !view.degraded && PlanFeatures::for_plan(view.plan).grants(query.feature);
        FeatureCheck {
            feature: query.feature,
            plan: view.plan,
            granted,
            degraded: view.degraded,
        }
    }
}
