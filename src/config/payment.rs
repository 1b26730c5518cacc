//! Payment configuration: provider secrets, price catalog, redirect URLs.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::entitlement::Plan;
use crate::domain::webhook::PriceCatalog;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Web provider secret API key, used for checkout and portal calls
    pub web_api_key: SecretString,

    /// Web provider webhook signing secret
    pub web_webhook_secret: SecretString,

    /// Mobile provider webhook signing secret
    pub mobile_webhook_secret: SecretString,

    /// Override for the web provider API base URL
    pub web_api_base_url: Option<String>,

    pub web_pro_price_id: Option<String>,
    pub web_max_price_id: Option<String>,

    /// Comma-separated mobile product ids granting each plan
    pub mobile_pro_product_ids: Option<String>,
    pub mobile_max_product_ids: Option<String>,

    #[serde(default = "default_success_url")]
    pub checkout_success_url: String,

    #[serde(default = "default_cancel_url")]
    pub checkout_cancel_url: String,

    #[serde(default = "default_portal_return_url")]
    pub portal_return_url: String,
}

impl PaymentConfig {
    /// Check if using web provider test mode
    pub fn is_test_mode(&self) -> bool {
        self.web_api_key.expose_secret().starts_with("sk_test_")
    }

    /// Every configured price and product id with its plan.
    fn catalog_entries(&self) -> Vec<(String, Plan)> {
        let web = [
            (&self.web_pro_price_id, Plan::Pro),
            (&self.web_max_price_id, Plan::Max),
        ]
        .into_iter()
        .filter_map(|(id, plan)| id.as_ref().map(|id| (id.trim().to_string(), plan)));

        let mobile = [
            (&self.mobile_pro_product_ids, Plan::Pro),
            (&self.mobile_max_product_ids, Plan::Max),
        ]
        .into_iter()
        .flat_map(|(ids, plan)| {
            ids.iter()
                .flat_map(|list| list.split(','))
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(move |id| (id.to_string(), plan))
                .collect::<Vec<_>>()
        });

        web.chain(mobile).filter(|(id, _)| !id.is_empty()).collect()
    }

    /// Price/product id to plan mapping shared by both providers.
    pub fn price_catalog(&self) -> PriceCatalog {
        self.catalog_entries()
            .into_iter()
            .fold(PriceCatalog::new(), |catalog, (id, plan)| catalog.with(id, plan))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.web_api_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__WEB_API_KEY"));
        }
        if self.web_webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__WEB_WEBHOOK_SECRET"));
        }
        if self.mobile_webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__MOBILE_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !self.web_api_key.expose_secret().starts_with("sk_") {
            return Err(ValidationError::InvalidApiKey);
        }
        if !self.web_webhook_secret.expose_secret().starts_with("whsec_") {
            return Err(ValidationError::InvalidWebhookSecret);
        }

        let entries = self.catalog_entries();
        for (i, (id, plan)) in entries.iter().enumerate() {
            if entries[i + 1..]
                .iter()
                .any(|(other, other_plan)| other == id && other_plan != plan)
            {
                return Err(ValidationError::DuplicatePriceId(id.clone()));
            }
        }

        Ok(())
    }
}

fn default_success_url() -> String {
    "http://localhost:3000/billing/success".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:3000/billing/cancel".to_string()
}

fn default_portal_return_url() -> String {
    "http://localhost:3000/account".to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_payment_config() -> PaymentConfig {
        PaymentConfig {
            web_api_key: SecretString::new("sk_test_xxx".to_string()),
            web_webhook_secret: SecretString::new("whsec_xxx".to_string()),
            mobile_webhook_secret: SecretString::new("mobile_xxx".to_string()),
            web_api_base_url: None,
            web_pro_price_id: Some("price_pro".to_string()),
            web_max_price_id: Some("price_max".to_string()),
            mobile_pro_product_ids: Some("app.pro.monthly, app.pro.annual".to_string()),
            mobile_max_product_ids: None,
            checkout_success_url: default_success_url(),
            checkout_cancel_url: default_cancel_url(),
            portal_return_url: default_portal_return_url(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = test_payment_config();
        assert!(config.validate().is_ok());
        assert!(config.is_test_mode());
    }

    #[test]
    fn test_catalog_covers_web_prices_and_mobile_products() {
        let catalog = test_payment_config().price_catalog();
        assert_eq!(catalog.plan_for("price_pro"), Some(Plan::Pro));
        assert_eq!(catalog.plan_for("price_max"), Some(Plan::Max));
        assert_eq!(catalog.plan_for("app.pro.annual"), Some(Plan::Pro));
        assert_eq!(catalog.plan_for("unknown"), None);
    }

    #[test]
    fn test_missing_mobile_secret() {
        let config = PaymentConfig {
            mobile_webhook_secret: SecretString::new(String::new()),
            ..test_payment_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("PAYMENT__MOBILE_WEBHOOK_SECRET"))
        );
    }

    #[test]
    fn test_invalid_key_prefixes() {
        let config = PaymentConfig {
            web_api_key: SecretString::new("pk_test_xxx".to_string()),
            ..test_payment_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidApiKey));

        let config = PaymentConfig {
            web_webhook_secret: SecretString::new("secret".to_string()),
            ..test_payment_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidWebhookSecret));
    }

    #[test]
    fn test_same_id_for_two_plans_is_rejected() {
        let config = PaymentConfig {
            web_max_price_id: Some("price_pro".to_string()),
            ..test_payment_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::DuplicatePriceId("price_pro".to_string()))
        );
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let rendered = format!("{:?}", test_payment_config());
        assert!(!rendered.contains("whsec_xxx"));
    }
}
