use std::time::Duration;

/// Configuration for the FleetBridge API
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote telematics API
    pub telematics_base_url: String,
    /// Whether API-key credential resolution against the secret store is enabled
    pub use_secret_store: bool,
    /// Timeout applied to every remote HTTP call
    pub http_timeout: Duration,
}

impl Config {
    /// Create a new Config instance from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let telematics_base_url = std::env::var("TELEMATICS_BASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("TELEMATICS_BASE_URL".to_string()))?;

        let use_secret_store = std::env::var("USE_SECRET_STORE")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        // Leave a buffer under the Lambda timeout for the response path
        let timeout_seconds = match std::env::var("TELEMATICS_TIMEOUT_SECONDS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                ConfigError::InvalidEnvVar("TELEMATICS_TIMEOUT_SECONDS".to_string())
            })?,
            Err(_) => 25,
        };

        Ok(Config {
            telematics_base_url,
            use_secret_store,
            http_timeout: Duration::from_secs(timeout_seconds),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidEnvVar(String),
}
