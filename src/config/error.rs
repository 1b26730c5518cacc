//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Failed to read teams file {path}: {source}")]
    TeamsFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse teams file {path}: {source}")]
    TeamsFileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid web provider API key format")]
    InvalidApiKey,

    #[error("Invalid web provider webhook secret format")]
    InvalidWebhookSecret,

    #[error("Price id '{0}' is mapped to more than one plan")]
    DuplicatePriceId(String),

    #[error("Invalid reconciliation setting: {0}")]
    InvalidReconciliation(&'static str),

    #[error("Team rule has an empty team id")]
    InvalidTeamRule,
}
