//! Configuration module for Veriflow.
//!
//! The configuration system follows these principles:
//!
//! 1. **Single Source of Truth**: all configuration is loaded once at startup
//! 2. **Fail Fast**: missing or invalid values are reported immediately
//! 3. **DTO Pattern**: configuration is immutable and passed via dependency injection
//! 4. **Env File Fallback**: process environment > `.env` file > defaults
//!
//! # Environment variables
//!
//! ## Required
//!
//! - `VERIFLOW_DATABASE_URL`: PostgreSQL connection string
//! - `VERIFLOW_NATS_URL`: NATS connection URL
//! - `VERIFLOW_MAIL_ENDPOINT`: mail gateway send endpoint (http/https URL)
//! - `VERIFLOW_MAIL_API_KEY`: mail gateway API key
//! - `VERIFLOW_MAIL_SENDER`: sender address for verification mails
//! - `VERIFLOW_VERIFY_LINK_BASE`: base URL embedded in verification links
//! - `VERIFLOW_AUTH_URL`: base URL of the authentication service
//!
//! ## Optional
//!
//! - `VERIFLOW_DB_POOL_SIZE` (default 10)
//! - `VERIFLOW_INTAKE_SUBJECT` (default "registration-intake")
//! - `VERIFLOW_VERIFY_SUBJECT` (default "verification")
//! - `VERIFLOW_NAK_DELAY_SECS` (default 5)
//! - `VERIFLOW_DOWNSTREAM_TIMEOUT_SECS` (default 10)
//! - `VERIFLOW_CB_FAILURE_THRESHOLD` (default 5)
//! - `VERIFLOW_CB_OPEN_SECS` (default 30)
//! - `RUST_LOG` (default "info")

pub mod dto;
pub mod error;
pub mod loader;
pub mod validator;

pub use dto::{
    DatabaseConfig, DownstreamConfig, LoggingConfig, MailGatewayConfig, NatsConfig, ServiceConfig,
    TopicsConfig,
};
pub use error::{ConfigError, Result};
pub use loader::ConfigLoader;
pub use validator::{validate_database_url, validate_http_url, validate_nats_url, validate_subject};
