//! Webhook signature verification.
//!
//! Both providers sign `"{timestamp}{separator}{raw body}"` with HMAC-SHA256:
//!
//! - web: `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>][,v0=<hex>]`, separator `.`
//! - mobile: `X-Mobile-Signature: ts=<unix>;sig=<hex>`, separator `:`
//!
//! The MAC is computed over the exact bytes received.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::AuthError;
use crate::domain::entitlement::Provider;
use crate::domain::foundation::Timestamp;

/// Default maximum age of a signed timestamp (5 minutes).
pub const DEFAULT_MAX_AGE_SECS: i64 = 300;

/// Default tolerance for timestamps from the future (1 minute).
pub const DEFAULT_FUTURE_SKEW_SECS: i64 = 60;

/// Header name carrying the web provider signature.
pub const WEB_SIGNATURE_HEADER: &str = "stripe-signature";

/// Header name carrying the mobile provider signature.
pub const MOBILE_SIGNATURE_HEADER: &str = "x-mobile-signature";

/// Parsed components of a provider signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp the provider signed.
    pub timestamp: i64,
    /// Candidate signatures. Providers send several while rotating secrets.
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a header for the given provider.
    pub fn parse(provider: Provider, header: &str) -> Result<Self, AuthError> {
        match provider {
            Provider::Web => Self::parse_fields(header, ',', "t", "v1"),
            Provider::Mobile => Self::parse_fields(header, ';', "ts", "sig"),
        }
    }

    fn parse_fields(
        header: &str,
        delimiter: char,
        timestamp_key: &str,
        signature_key: &str,
    ) -> Result<Self, AuthError> {
        let mut timestamp: Option<i64> = None;
        let mut signatures = Vec::new();

        for part in header.split(delimiter) {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| AuthError::invalid("malformed header"))?;

            if key == timestamp_key {
                timestamp = Some(
                    value
                        .parse()
                        .map_err(|_| AuthError::invalid("invalid timestamp"))?,
                );
            } else if key == signature_key {
                signatures.push(
                    hex::decode(value).map_err(|_| AuthError::invalid("invalid signature hex"))?,
                );
            }
            // Unknown fields (legacy schemes) are ignored
        }

        let timestamp = timestamp.ok_or_else(|| AuthError::invalid("missing timestamp"))?;
        if signatures.is_empty() {
            return Err(AuthError::invalid("missing signature"));
        }

        Ok(SignatureHeader {
            timestamp,
            signatures,
        })
    }
}

/// Verifies provider webhook signatures.
pub struct SignatureVerifier {
    web_secret: SecretString,
    mobile_secret: SecretString,
    max_age_secs: i64,
    future_skew_secs: i64,
}

impl SignatureVerifier {
    pub fn new(web_secret: SecretString, mobile_secret: SecretString) -> Self {
        Self {
            web_secret,
            mobile_secret,
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            future_skew_secs: DEFAULT_FUTURE_SKEW_SECS,
        }
    }

    /// Overrides the accepted timestamp window.
    pub fn with_tolerance(mut self, max_age_secs: i64, future_skew_secs: i64) -> Self {
        self.max_age_secs = max_age_secs;
        self.future_skew_secs = future_skew_secs;
        self
    }

    /// Verifies `raw_body` against the provider's signature header.
    pub fn verify(
        &self,
        provider: Provider,
        raw_body: &[u8],
        header: Option<&str>,
    ) -> Result<(), AuthError> {
        self.verify_at(provider, raw_body, header, Timestamp::now())
    }

    /// Same as [`verify`](Self::verify) with an explicit clock.
    pub fn verify_at(
        &self,
        provider: Provider,
        raw_body: &[u8],
        header: Option<&str>,
        now: Timestamp,
    ) -> Result<(), AuthError> {
        let header = header
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| AuthError::invalid("missing header"))?;
        let header = SignatureHeader::parse(provider, header)?;

        let expected = compute_signature(self.secret(provider), provider, header.timestamp, raw_body)?;
        if !header
            .signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate))
        {
            return Err(AuthError::invalid("signature mismatch"));
        }

        let age_secs = now.as_unix_secs() - header.timestamp;
        if age_secs > self.max_age_secs || age_secs < -self.future_skew_secs {
            return Err(AuthError::ClockSkew { age_secs });
        }

        Ok(())
    }

    fn secret(&self, provider: Provider) -> &str {
        match provider {
            Provider::Web => self.web_secret.expose_secret(),
            Provider::Mobile => self.mobile_secret.expose_secret(),
        }
    }
}

/// Builds a signature header the way the provider would.
///
/// Used by replay tooling and tests.
pub fn sign_header(
    provider: Provider,
    secret: &str,
    timestamp: i64,
    raw_body: &[u8],
) -> Result<String, AuthError> {
    let signature = hex::encode(compute_signature(secret, provider, timestamp, raw_body)?);
    Ok(match provider {
        Provider::Web => format!("t={},v1={}", timestamp, signature),
        Provider::Mobile => format!("ts={};sig={}", timestamp, signature),
    })
}

fn compute_signature(
    secret: &str,
    provider: Provider,
    timestamp: i64,
    raw_body: &[u8],
) -> Result<Vec<u8>, AuthError> {
    let separator: &[u8] = match provider {
        Provider::Web => b".",
        Provider::Mobile => b":",
    };
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| AuthError::invalid("unusable signing secret"))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(separator);
    mac.update(raw_body);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time comparison; lengths are not secret.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
