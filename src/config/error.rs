//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
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

    #[error("Invalid socket address {0}")]
    InvalidSocketAddr(String),

    #[error("Invalid URL for {0}")]
    InvalidUrl(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("No payment provider configured")]
    NoProviderConfigured,

    #[error("Invalid key format for {0}")]
    InvalidKeyFormat(&'static str),

    #[error("Live mode for {0} requires a live key")]
    LiveModeRequiresLiveKey(&'static str),

    #[error("Intent TTL must be between 60 seconds and 7 days")]
    InvalidIntentTtl,

    #[error("Rate cache TTL must be between 1 second and 1 day")]
    InvalidRateCacheTtl,
}
