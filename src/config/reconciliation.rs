//! Reconciliation tuning: signature window, retry bounds, ledger retention.

use serde::Deserialize;

use super::error::ValidationError;
use crate::application::RetryLimits;
use crate::domain::webhook::{DEFAULT_FUTURE_SKEW_SECS, DEFAULT_MAX_AGE_SECS};

/// Upper bound on ledger retention (100 years).
pub const MAX_LEDGER_RETENTION_DAYS: u32 = 36_500;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReconciliationConfig {
    /// Maximum age of a signed webhook timestamp
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_secs: i64,

    /// Accepted clock skew for timestamps from the future
    #[serde(default = "default_future_skew")]
    pub future_skew_secs: i64,

    #[serde(default = "default_max_attempts")]
    pub max_cas_attempts: u32,

    #[serde(default = "default_max_attempts")]
    pub max_mapping_attempts: u32,

    /// Days to keep idempotency entries; 0 keeps them forever
    #[serde(default = "default_ledger_retention_days")]
    pub ledger_retention_days: u32,

    /// How often the retention task runs
    #[serde(default = "default_prune_interval")]
    pub prune_interval_secs: u64,
}

impl ReconciliationConfig {
    pub fn retry_limits(&self) -> RetryLimits {
        RetryLimits {
            max_cas_attempts: self.max_cas_attempts,
            max_mapping_attempts: self.max_mapping_attempts,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.signature_tolerance_secs <= 0 {
            return Err(ValidationError::InvalidReconciliation(
                "signature_tolerance_secs must be positive",
            ));
        }
        if self.future_skew_secs < 0 {
            return Err(ValidationError::InvalidReconciliation(
                "future_skew_secs must not be negative",
            ));
        }
        if self.max_cas_attempts == 0 || self.max_mapping_attempts == 0 {
            return Err(ValidationError::InvalidReconciliation(
                "attempt limits must be at least 1",
            ));
        }
        if self.ledger_retention_days > MAX_LEDGER_RETENTION_DAYS {
            return Err(ValidationError::InvalidReconciliation(
                "ledger_retention_days must be at most 36500",
            ));
        }
        if self.prune_interval_secs == 0 {
            return Err(ValidationError::InvalidReconciliation(
                "prune_interval_secs must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            signature_tolerance_secs: default_signature_tolerance(),
            future_skew_secs: default_future_skew(),
            max_cas_attempts: default_max_attempts(),
            max_mapping_attempts: default_max_attempts(),
            ledger_retention_days: default_ledger_retention_days(),
            prune_interval_secs: default_prune_interval(),
        }
    }
}

fn default_signature_tolerance() -> i64 {
    DEFAULT_MAX_AGE_SECS
}

fn default_future_skew() -> i64 {
    DEFAULT_FUTURE_SKEW_SECS
}

fn default_max_attempts() -> u32 {
    5
}

fn default_ledger_retention_days() -> u32 {
    90
}

fn default_prune_interval() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconciliationConfig::default();
        assert_eq!(config.signature_tolerance_secs, 300);
        assert_eq!(config.future_skew_secs, 60);
        assert_eq!(config.ledger_retention_days, 90);
        assert_eq!(config.retry_limits(), RetryLimits::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = ReconciliationConfig {
            max_cas_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_retention_is_valid() {
        let config = ReconciliationConfig {
            ledger_retention_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_excessive_retention_rejected() {
        let config = ReconciliationConfig {
            ledger_retention_days: u32::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ReconciliationConfig {
            ledger_retention_days: MAX_LEDGER_RETENTION_DAYS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
