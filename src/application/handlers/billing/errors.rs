//! Billing handler errors.

use thiserror::Error;

use crate::domain::entitlement::Plan;
use crate::ports::GatewayError;

#[derive(Debug, Error)]
pub enum BillingError {
    /// The free plan has no checkout.
    #[error("plan '{0}' cannot be purchased")]
    NotPurchasable(Plan),

    #[error("no web price configured for plan '{0}'")]
    PriceNotConfigured(Plan),

    /// User has never completed a web checkout.
    #[error("user has no web billing account")]
    NoBillingAccount,

    #[error("payment provider error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("entitlement store unavailable: {0}")]
    StorageUnavailable(String),
}
