//! Conversion of handler errors into HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::dto::ErrorResponse;
use crate::application::BillingError;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::webhook::{AuthError, WebhookError};
use crate::ports::GatewayErrorCode;

/// API error type that converts handler errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Webhook(WebhookError),
    Billing(BillingError),
    /// Path or body value that does not parse.
    Validation(DomainError),
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        ApiError::Webhook(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        ApiError::Billing(err)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Webhook(err) => {
                let code = match err {
                    WebhookError::Auth(AuthError::InvalidSignature(_)) => "INVALID_SIGNATURE",
                    WebhookError::Auth(AuthError::ClockSkew { .. }) => "CLOCK_SKEW",
                    WebhookError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
                    WebhookError::MappingUnresolved { .. } => "MAPPING_UNRESOLVED",
                    WebhookError::ReconciliationFailed { .. } => "RECONCILIATION_FAILED",
                    WebhookError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
                };
                (err.status_code(), code)
            }
            ApiError::Billing(err) => match err {
                BillingError::NotPurchasable(_) => (StatusCode::BAD_REQUEST, "PLAN_NOT_PURCHASABLE"),
                BillingError::PriceNotConfigured(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "PRICE_NOT_CONFIGURED")
                }
                BillingError::NoBillingAccount => (StatusCode::NOT_FOUND, "NO_BILLING_ACCOUNT"),
                BillingError::Gateway(gateway) => match gateway.code {
                    GatewayErrorCode::RateLimited | GatewayErrorCode::NetworkError => {
                        (StatusCode::SERVICE_UNAVAILABLE, "PAYMENT_PROVIDER_UNAVAILABLE")
                    }
                    _ => (StatusCode::BAD_GATEWAY, "PAYMENT_PROVIDER_ERROR"),
                },
                BillingError::StorageUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE")
                }
            },
            ApiError::Validation(err) => {
                let status = match err.code {
                    ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidStateTransition => StatusCode::CONFLICT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code.as_str())
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Webhook(err) => err.to_string(),
            ApiError::Billing(err) => err.to_string(),
            ApiError::Validation(err) => err.message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error_code = code, error = %self.message(), "request failed");
        }
        (status, Json(ErrorResponse::new(code, self.message()))).into_response()
    }
}
