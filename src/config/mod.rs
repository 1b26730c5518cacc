//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `ENTITLEMENT_CORE`
//! prefix and `__` between nested keys. An optional `entitlement-core`
//! file (yaml or toml) in the working directory is read first.
//!
//! # Example
//!
//! ```no_run
//! use entitlement_core::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod payment;
mod reconciliation;
mod redis;
mod server;
mod teams;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use reconciliation::ReconciliationConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use teams::TeamsConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL store and ledger; in-memory adapters when absent
    pub database: Option<DatabaseConfig>,

    /// Redis-backed idempotency ledger
    pub redis: Option<RedisConfig>,

    /// Provider secrets and price catalog
    pub payment: PaymentConfig,

    #[serde(default)]
    pub reconciliation: ReconciliationConfig,

    #[serde(default)]
    pub teams: TeamsConfig,
}

impl AppConfig {
    /// Load configuration from the environment
    ///
    /// - `ENTITLEMENT_CORE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ENTITLEMENT_CORE__PAYMENT__WEB_WEBHOOK_SECRET=...` -> `payment.web_webhook_secret`
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("entitlement-core").required(false))
            .add_source(
                config::Environment::default()
                    .prefix("ENTITLEMENT_CORE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        self.payment.validate()?;
        self.reconciliation.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "ENTITLEMENT_CORE__PAYMENT__WEB_API_KEY",
        "ENTITLEMENT_CORE__PAYMENT__WEB_WEBHOOK_SECRET",
        "ENTITLEMENT_CORE__PAYMENT__MOBILE_WEBHOOK_SECRET",
        "ENTITLEMENT_CORE__PAYMENT__WEB_PRO_PRICE_ID",
        "ENTITLEMENT_CORE__SERVER__PORT",
        "ENTITLEMENT_CORE__SERVER__ENVIRONMENT",
        "ENTITLEMENT_CORE__DATABASE__URL",
        "ENTITLEMENT_CORE__RECONCILIATION__MAX_CAS_ATTEMPTS",
    ];

    fn set_minimal_env() {
        env::set_var("ENTITLEMENT_CORE__PAYMENT__WEB_API_KEY", "sk_test_xxx");
        env::set_var("ENTITLEMENT_CORE__PAYMENT__WEB_WEBHOOK_SECRET", "whsec_xxx");
        env::set_var("ENTITLEMENT_CORE__PAYMENT__MOBILE_WEBHOOK_SECRET", "mobile_xxx");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_minimal_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert!(config.database.is_none());
        assert!(config.redis.is_none());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.reconciliation, ReconciliationConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("ENTITLEMENT_CORE__SERVER__PORT", "3000"),
            ("ENTITLEMENT_CORE__SERVER__ENVIRONMENT", "production"),
            ("ENTITLEMENT_CORE__DATABASE__URL", "postgres://localhost/entitlements"),
            ("ENTITLEMENT_CORE__RECONCILIATION__MAX_CAS_ATTEMPTS", "8"),
            ("ENTITLEMENT_CORE__PAYMENT__WEB_PRO_PRICE_ID", "price_ABC"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(
            config.database.map(|d| d.url),
            Some("postgres://localhost/entitlements".to_string())
        );
        assert_eq!(config.reconciliation.max_cas_attempts, 8);
        assert_eq!(config.payment.web_pro_price_id.as_deref(), Some("price_ABC"));
    }

    #[test]
    fn test_missing_payment_section_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load().is_err());
    }
}
