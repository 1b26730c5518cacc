//! Stripe implementation of CheckoutGateway.
//!
//! Form-encoded calls against the Stripe REST API, authenticated with the
//! secret key as the basic-auth username.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::ports::{
    CheckoutGateway, CheckoutRequest, CheckoutSession, GatewayError, GatewayErrorCode,
    PortalSession,
};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the API, overridden in tests.
    api_base_url: String,
}

impl StripeConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

pub struct StripeCheckoutGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Deserialize)]
struct PortalSessionResponse {
    url: String,
}

impl StripeCheckoutGateway {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.config.api_base_url, path);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::provider(format!("Failed to parse Stripe response: {}", e)))
    }
}

fn error_from_response(status: reqwest::StatusCode, body: &str) -> GatewayError {
    let code = match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            GatewayErrorCode::AuthenticationError
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => GatewayErrorCode::RateLimited,
        s if s.is_client_error() => GatewayErrorCode::InvalidRequest,
        _ => GatewayErrorCode::ProviderError,
    };

    match serde_json::from_str::<StripeErrorBody>(body) {
        Ok(parsed) => {
            let message = parsed
                .error
                .message
                .unwrap_or_else(|| format!("Stripe API error ({})", status));
            let err = GatewayError::new(code, message);
            match parsed.error.code {
                Some(provider_code) => err.with_provider_code(provider_code),
                None => err,
            }
        }
        Err(_) => GatewayError::new(code, format!("Stripe API error ({}): {}", status, body)),
    }
}

fn checkout_params(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("mode", "subscription".to_string()),
        ("line_items[0][price]", request.price_id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("client_reference_id", request.user_id.to_string()),
        ("metadata[user_id]", request.user_id.to_string()),
        ("metadata[plan]", request.plan.as_str().to_string()),
        (
            "subscription_data[metadata][user_id]",
            request.user_id.to_string(),
        ),
        (
            "subscription_data[metadata][plan]",
            request.plan.as_str().to_string(),
        ),
    ];

    if let Some(customer) = &request.customer_id {
        params.push(("customer", customer.clone()));
    }

    params
}

#[async_trait]
impl CheckoutGateway for StripeCheckoutGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let session: CheckoutSessionResponse = self
            .post_form("/v1/checkout/sessions", &checkout_params(&request))
            .await?;

        let url = session
            .url
            .unwrap_or_else(|| format!("https://checkout.stripe.com/c/pay/{}", session.id));

        tracing::info!(
            user_id = %request.user_id,
            plan = %request.plan,
            session_id = %session.id,
            "checkout session created"
        );

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, GatewayError> {
        let portal: PortalSessionResponse = self
            .post_form(
                "/v1/billing_portal/sessions",
                &[
                    ("customer", customer_id.to_string()),
                    ("return_url", return_url.to_string()),
                ],
            )
            .await?;

        Ok(PortalSession { url: portal.url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::UserId;

    fn request(customer_id: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            user_id: UserId::new("user-1").unwrap(),
            plan: Plan::Pro,
            price_id: "price_pro".to_string(),
            customer_id: customer_id.map(str::to_string),
            success_url: "https://app.test/ok".to_string(),
            cancel_url: "https://app.test/cancel".to_string(),
        }
    }

    fn param<'a>(params: &'a [(&str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn config_defaults_to_live_api() {
        let config = StripeConfig::new(SecretString::new("sk_test".to_string()));
        assert_eq!(config.api_base_url, "https://api.stripe.com");
        let config = config.with_base_url("http://localhost:12111");
        assert_eq!(config.api_base_url, "http://localhost:12111");
    }

    #[test]
    fn checkout_params_carry_user_and_plan() {
        let params = checkout_params(&request(None));
        assert_eq!(param(&params, "mode"), Some("subscription"));
        assert_eq!(param(&params, "client_reference_id"), Some("user-1"));
        assert_eq!(param(&params, "metadata[user_id]"), Some("user-1"));
        assert_eq!(param(&params, "metadata[plan]"), Some("pro"));
        assert_eq!(param(&params, "line_items[0][price]"), Some("price_pro"));
        assert_eq!(param(&params, "customer"), None);
    }

    #[test]
    fn checkout_params_reuse_existing_customer() {
        let params = checkout_params(&request(Some("cus_9")));
        assert_eq!(param(&params, "customer"), Some("cus_9"));
    }

    #[test]
    fn error_body_is_parsed_into_gateway_error() {
        let body = r#"{"error":{"code":"resource_missing","message":"No such price"}}"#;
        let err = error_from_response(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(err.code, GatewayErrorCode::InvalidRequest);
        assert_eq!(err.message, "No such price");
        assert_eq!(err.provider_code.as_deref(), Some("resource_missing"));
    }

    #[test]
    fn rate_limit_is_retryable() {
        let err = error_from_response(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(err.code, GatewayErrorCode::RateLimited);
        assert!(err.is_retryable());
    }
}
