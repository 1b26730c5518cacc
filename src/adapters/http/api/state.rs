//! Shared state for the HTTP routes.

use std::sync::Arc;

use crate::application::{
    CanViewHandler, CheckFeatureHandler, CheckoutUrls, CountVisibleHandler,
    CreateCheckoutHandler, CreatePortalHandler, GetEntitlementHandler, ProcessWebhookHandler,
    RetryLimits,
};
use crate::domain::visibility::VisibilityPolicy;
use crate::domain::webhook::{EventNormalizer, PriceCatalog, SignatureVerifier};
use crate::ports::{CheckoutGateway, EntitlementStore, IdempotencyLedger, OperatorAlerts};

/// Application state holding the adapters and domain services.
///
/// Handlers are built per request from these shared pieces.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntitlementStore>,
    pub ledger: Arc<dyn IdempotencyLedger>,
    pub alerts: Arc<dyn OperatorAlerts>,
    pub gateway: Arc<dyn CheckoutGateway>,
    pub verifier: Arc<SignatureVerifier>,
    pub normalizer: Arc<EventNormalizer>,
    pub catalog: Arc<PriceCatalog>,
    pub visibility: Arc<VisibilityPolicy>,
    pub retry_limits: RetryLimits,
    pub checkout_urls: CheckoutUrls,
    pub portal_return_url: String,
}

impl AppState {
    pub fn process_webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.verifier.clone(),
            self.normalizer.clone(),
            self.ledger.clone(),
            self.store.clone(),
            self.alerts.clone(),
        )
        .with_limits(self.retry_limits)
    }

    pub fn get_entitlement_handler(&self) -> GetEntitlementHandler {
        GetEntitlementHandler::new(self.store.clone())
    }

    pub fn check_feature_handler(&self) -> CheckFeatureHandler {
        CheckFeatureHandler::new(self.get_entitlement_handler())
    }

    pub fn create_checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(
            self.gateway.clone(),
            self.store.clone(),
            self.catalog.clone(),
            self.checkout_urls.clone(),
        )
    }

    pub fn create_portal_handler(&self) -> CreatePortalHandler {
        CreatePortalHandler::new(
            self.gateway.clone(),
            self.store.clone(),
            self.portal_return_url.clone(),
        )
    }

    pub fn can_view_handler(&self) -> CanViewHandler {
        CanViewHandler::new(self.visibility.clone())
    }

    pub fn count_visible_handler(&self) -> CountVisibleHandler {
        CountVisibleHandler::new(self.visibility.clone())
    }
}
