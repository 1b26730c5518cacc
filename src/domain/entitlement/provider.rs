//! Billing providers that can write to an entitlement record.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Billing provider, one slot per provider on every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Web checkout/billing provider (Stripe-shaped webhooks).
    Web,

    /// Client-side in-app-purchase provider.
    Mobile,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Web, Provider::Mobile];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Web => "web",
            Provider::Mobile => "mobile",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(Provider::Web),
            "mobile" => Ok(Provider::Mobile),
            other => Err(ValidationError::invalid_format(
                "provider",
                format!("unknown provider '{}'", other),
            )),
        }
    }
}
