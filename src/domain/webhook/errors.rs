//! Webhook error types.
//!
//! `AuthError` and `NormalizationError` come from the pure verification and
//! mapping steps. `WebhookError` is what the processing pipeline returns when
//! the delivery must not be acknowledged.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status | Provider retries |
//! |-------|-------------|------------------|
//! | Auth | 400 | yes |
//! | MalformedPayload | 400 | yes |
//! | MappingUnresolved | 500 | yes, bounded |
//! | ReconciliationFailed | 500 | yes |
//! | StorageUnavailable | 500 | yes |

use axum::http::StatusCode;
use thiserror::Error;

/// Webhook authenticity failures. The event is never trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Header absent, malformed, or signature mismatch.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Signed timestamp outside the accepted window. Negative age = future.
    #[error("signed timestamp outside accepted window (age {age_secs}s)")]
    ClockSkew { age_secs: i64 },
}

impl AuthError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        AuthError::InvalidSignature(reason.into())
    }
}

/// Failures mapping a verified provider payload into a canonical event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    /// Event type outside the known set. Acknowledged and dropped.
    #[error("unrecognized event kind '{0}'")]
    UnrecognizedEventKind(String),

    /// Event cannot be tied to an internal user.
    #[error("event {event_id} has no user mapping")]
    MissingUserMapping { event_id: String },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Errors that stop a webhook delivery from being acknowledged.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// User mapping still missing; the provider's retry may resolve it.
    #[error("event {event_id} has no user mapping (attempt {attempt})")]
    MappingUnresolved { event_id: String, attempt: u32 },

    /// Optimistic write kept conflicting.
    #[error("reconciliation failed after {attempts} attempts")]
    ReconciliationFailed { attempts: u32 },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::MappingUnresolved { .. }
                | WebhookError::ReconciliationFailed { .. }
                | WebhookError::StorageUnavailable(_)
        )
    }

    /// Maps the error to the response status for the delivering provider.
    ///
    /// Never 500 for an event that can not succeed on retry.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Auth(_) | WebhookError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::MappingUnresolved { .. }
            | WebhookError::ReconciliationFailed { .. }
            | WebhookError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_bad_requests() {
        let err: WebhookError = AuthError::ClockSkew { age_secs: 900 }.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_retryable());
    }

    #[test]
    fn transient_errors_are_server_errors() {
        for err in [
            WebhookError::StorageUnavailable("pool timed out".to_string()),
            WebhookError::ReconciliationFailed { attempts: 5 },
            WebhookError::MappingUnresolved {
                event_id: "evt_1".to_string(),
                attempt: 2,
            },
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn auth_error_display_is_transparent() {
        let err: WebhookError = AuthError::invalid("missing header").into();
        assert_eq!(err.to_string(), "invalid signature: missing header");
    }
}
