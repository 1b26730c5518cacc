//! CreateCheckoutHandler - Command handler for starting a web subscription.

use std::sync::Arc;

use super::BillingError;
use crate::domain::entitlement::Plan;
use crate::domain::foundation::UserId;
use crate::domain::webhook::PriceCatalog;
use crate::ports::{CheckoutGateway, CheckoutRequest, CheckoutSession, EntitlementStore};

#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub user_id: UserId,
    pub plan: Plan,
}

/// Redirect targets for the hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// Creates a hosted checkout session for a paid plan.
///
/// The entitlement itself changes only when the resulting webhook arrives.
pub struct CreateCheckoutHandler {
    gateway: Arc<dyn CheckoutGateway>,
    store: Arc<dyn EntitlementStore>,
    catalog: Arc<PriceCatalog>,
    urls: CheckoutUrls,
}

impl CreateCheckoutHandler {
    pub fn new(
        gateway: Arc<dyn CheckoutGateway>,
        store: Arc<dyn EntitlementStore>,
        catalog: Arc<PriceCatalog>,
        urls: CheckoutUrls,
    ) -> Self {
        Self {
            gateway,
            store,
            catalog,
            urls,
        }
    }

    pub async fn handle(&self, cmd: CreateCheckoutCommand) -> Result<CheckoutSession, BillingError> {
        if !cmd.plan.is_paid() {
            return Err(BillingError::NotPurchasable(cmd.plan));
        }
        let price_id = self
            .catalog
            .price_for(cmd.plan)
            .ok_or(BillingError::PriceNotConfigured(cmd.plan))?
            .to_string();

        let record = self
            .store
            .get(&cmd.user_id)
            .await
            .map_err(|e| BillingError::StorageUnavailable(e.to_string()))?;

        let session = self
            .gateway
            .create_checkout_session(CheckoutRequest {
                user_id: cmd.user_id,
                plan: cmd.plan,
                price_id,
                customer_id: record.web_customer_id().map(str::to_string),
                success_url: self.urls.success_url.clone(),
                cancel_url: self.urls.cancel_url.clone(),
            })
            .await?;

        Ok(session)
    }
}
