//! Configuration loader.
//!
//! Loads configuration from an optional `.env` file followed by environment
//! variables, validates it, and returns an immutable [`ServiceConfig`].

use std::path::PathBuf;

use super::dto::{
    DatabaseConfig, DownstreamConfig, LoggingConfig, MailGatewayConfig, NatsConfig, ServiceConfig,
    TopicsConfig,
};
use super::error::{ConfigError, Result};
use super::validator::validate_service_config;

/// Configuration loader.
///
/// The `.env` file fills in variables the process environment does not set;
/// already-set variables win, so deployments can override a checked-in file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_file_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new loader with an optional `.env` file path.
    pub fn new(env_file_path: Option<PathBuf>) -> Self {
        Self { env_file_path }
    }

    /// Load and validate the full service configuration.
    pub fn load(&self) -> Result<ServiceConfig> {
        if let Some(path) = &self.env_file_path {
            if path.exists() {
                dotenv::from_path(path).map_err(|source| ConfigError::EnvFileLoad {
                    path: path.clone(),
                    source,
                })?;
            }
        }

        let config = ServiceConfig {
            database: DatabaseConfig {
                url: required("VERIFLOW_DATABASE_URL")?,
                pool_size: optional_parsed("VERIFLOW_DB_POOL_SIZE", 10)?,
                min_idle: optional_parsed("VERIFLOW_DB_MIN_IDLE", 1)?,
                connect_timeout_secs: optional_parsed("VERIFLOW_DB_CONNECT_TIMEOUT_SECS", 30)?,
            },
            nats: NatsConfig {
                url: required("VERIFLOW_NATS_URL")?,
                connect_timeout_secs: optional_parsed("VERIFLOW_NATS_CONNECT_TIMEOUT_SECS", 5)?,
                name: std::env::var("VERIFLOW_NATS_CLIENT_NAME").ok(),
            },
            topics: TopicsConfig {
                intake_subject: optional("VERIFLOW_INTAKE_SUBJECT", "registration-intake"),
                verify_subject: optional("VERIFLOW_VERIFY_SUBJECT", "verification"),
                intake_stream: optional("VERIFLOW_INTAKE_STREAM", "VERIFLOW_INTAKE"),
                verify_stream: optional("VERIFLOW_VERIFY_STREAM", "VERIFLOW_VERIFY"),
                intake_durable: optional("VERIFLOW_INTAKE_DURABLE", "veriflow-intake"),
                verify_durable: optional("VERIFLOW_VERIFY_DURABLE", "veriflow-verify"),
                nak_delay_secs: optional_parsed("VERIFLOW_NAK_DELAY_SECS", 5)?,
                drain_timeout_secs: optional_parsed("VERIFLOW_DRAIN_TIMEOUT_SECS", 10)?,
            },
            mail: MailGatewayConfig {
                endpoint: required("VERIFLOW_MAIL_ENDPOINT")?,
                api_key: required("VERIFLOW_MAIL_API_KEY")?,
                sender_email: required("VERIFLOW_MAIL_SENDER")?,
                sender_name: std::env::var("VERIFLOW_MAIL_SENDER_NAME").ok(),
                verify_link_base: required("VERIFLOW_VERIFY_LINK_BASE")?,
                timeout_secs: optional_parsed("VERIFLOW_MAIL_TIMEOUT_SECS", 10)?,
            },
            downstream: DownstreamConfig {
                base_url: required("VERIFLOW_AUTH_URL")?,
                timeout_secs: optional_parsed("VERIFLOW_DOWNSTREAM_TIMEOUT_SECS", 10)?,
                failure_threshold: optional_parsed("VERIFLOW_CB_FAILURE_THRESHOLD", 5)?,
                open_duration_secs: optional_parsed("VERIFLOW_CB_OPEN_SECS", 30)?,
                success_threshold: optional_parsed("VERIFLOW_CB_SUCCESS_THRESHOLD", 2)?,
            },
            logging: LoggingConfig {
                level: optional("RUST_LOG", "info"),
            },
        };

        validate_service_config(&config)?;
        Ok(config)
    }
}

fn required(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| ConfigError::MissingRequired {
        var: var.to_string(),
    })
}

fn optional(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn optional_parsed<T: std::str::FromStr>(var: &str, default: T) -> Result<T> {
    match std::env::var(var) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_without_env_file_reports_missing_required() {
        // None of the required variables are set under `cargo test`.
        let loader = ConfigLoader::new(None);
        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));
    }

    #[test]
    fn missing_env_file_is_ignored() {
        let loader = ConfigLoader::new(Some(PathBuf::from("/nonexistent/.env")));
        // Still fails on required vars, not on the missing file.
        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));
    }
}
