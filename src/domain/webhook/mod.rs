//! Inbound webhook domain: authenticity checks and payload normalization.
//!
//! # Module Structure
//!
//! - `signature` - HMAC-SHA256 signature verification for both providers
//! - `web_event` - Web provider payload shapes
//! - `mobile_event` - Mobile provider payload shapes
//! - `normalizer` - Maps provider payloads to `EntitlementEvent`
//! - `errors` - AuthError, NormalizationError, WebhookError

mod errors;
mod mobile_event;
mod normalizer;
mod signature;
mod web_event;

pub use errors::{AuthError, NormalizationError, WebhookError};
pub use mobile_event::{MobileEnvelope, MobileEvent, MobileEventType, ANONYMOUS_USER_PREFIX};
pub use normalizer::{EventNormalizer, PriceCatalog};
pub use signature::{
    sign_header, SignatureHeader, SignatureVerifier, DEFAULT_FUTURE_SKEW_SECS,
    DEFAULT_MAX_AGE_SECS, MOBILE_SIGNATURE_HEADER, WEB_SIGNATURE_HEADER,
};
pub use web_event::{WebEvent, WebEventType};
