//! CreatePortalHandler - Command handler for the web billing portal.

use std::sync::Arc;

use super::BillingError;
use crate::domain::foundation::UserId;
use crate::ports::{CheckoutGateway, EntitlementStore, PortalSession};

#[derive(Debug, Clone)]
pub struct CreatePortalCommand {
    pub user_id: UserId,
}

/// Opens the provider's self-service portal for the user's web customer.
pub struct CreatePortalHandler {
    gateway: Arc<dyn CheckoutGateway>,
    store: Arc<dyn EntitlementStore>,
    return_url: String,
}

impl CreatePortalHandler {
    pub fn new(
        gateway: Arc<dyn CheckoutGateway>,
        store: Arc<dyn EntitlementStore>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            store,
            return_url: return_url.into(),
        }
    }

    pub async fn handle(&self, cmd: CreatePortalCommand) -> Result<PortalSession, BillingError> {
        let record = self
            .store
            .get(&cmd.user_id)
            .await
            .map_err(|e| BillingError::StorageUnavailable(e.to_string()))?;

        let customer_id = record
            .web_customer_id()
            .ok_or(BillingError::NoBillingAccount)?;

        Ok(self
            .gateway
            .create_portal_session(customer_id, &self.return_url)
            .await?)
    }
}
