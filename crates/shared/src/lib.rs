//! Shared configuration for the Veriflow services.
//!
//! Configuration is loaded exactly once at startup into immutable DTOs and
//! passed into each component's constructor. Nothing in the codebase reads
//! the process environment after startup.

pub mod config;

pub use config::{
    ConfigError, ConfigLoader, DatabaseConfig, DownstreamConfig, LoggingConfig, MailGatewayConfig,
    NatsConfig, ServiceConfig, TopicsConfig,
};
