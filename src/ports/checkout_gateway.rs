//! CheckoutGateway port - provider-hosted checkout and billing portal.
//!
//! A thin call-through. Nothing here touches entitlement state; the
//! resulting subscription arrives later through the webhook pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entitlement::Plan;
use crate::domain::foundation::UserId;

/// Port for the web provider's hosted payment pages.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Create a checkout session for a new subscription.
    ///
    /// Returns a URL for the user to complete payment.
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Create a billing portal session for subscription management.
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, GatewayError>;
}

/// Request to create a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Internal user id, echoed back by the provider in webhook metadata.
    pub user_id: UserId,

    pub plan: Plan,

    /// Provider price id for the plan.
    pub price_id: String,

    /// Existing provider customer, reused when present.
    pub customer_id: Option<String>,

    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSession {
    pub url: String,
}

/// Errors from provider call-through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    /// Provider's error code (if available).
    pub provider_code: Option<String>,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ProviderError, message)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code,
            GatewayErrorCode::NetworkError | GatewayErrorCode::RateLimited
        )
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    NetworkError,
    AuthenticationError,
    RateLimited,
    InvalidRequest,
    ProviderError,
}
